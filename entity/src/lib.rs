//! SeaORM entities persisted by groundwork.

pub mod prelude;

pub mod app_role;
pub mod app_user;
pub mod app_user_role;
