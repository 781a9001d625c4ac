//! Test fixture modules for database record creation.
//!
//! - `user` - application users, roles and role assignments

pub mod user;
