//! User and role fixture utilities.
//!
//! This module provides methods for inserting user-related test records directly
//! through SeaORM, bypassing the repository layer under test, and factory functions
//! for creating in-memory model instances.

pub mod data;
pub mod factory;
