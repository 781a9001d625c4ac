mod get_user;
mod index;

use super::*;
