//! Database model type aliases and their data layer capabilities.
//!
//! This module provides type aliases for the SeaORM models used throughout the application
//! and registers each of them as a [`DbEntity`](crate::server::data::entity::DbEntity) so the
//! generic repository, services and unit of work can operate on them.

use crate::db_entity;

/// Type alias for an application user.
///
/// # Fields (from `entity::app_user::Model`)
/// - `id` - Primary key, assigned by the database
/// - `user_name` - Unique login name
/// - `email` - Contact address
/// - `display_name` - Optional name shown instead of the login name
/// - `password_hash` - Credential hash, never exposed through the API
/// - `created_at` - Timestamp when the user was created
pub type AppUserModel = entity::app_user::Model;

/// Type alias for a named role.
pub type AppRoleModel = entity::app_role::Model;

/// Type alias for the assignment of a role to a user.
pub type AppUserRoleModel = entity::app_user_role::Model;

db_entity!(entity::app_user { key: id: i32 => Id });
db_entity!(entity::app_role { key: id: i32 => Id });
db_entity!(entity::app_user_role { key: id: i32 => Id });
