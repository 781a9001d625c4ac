//! Factory functions for generating mock user database models.
//!
//! Provides pure functions for creating user and role models with standard test values.
//! These are in-memory model instances that don't require database interaction.

use chrono::Utc;

use crate::constant::TEST_PASSWORD_HASH;

/// Create a mock user model that has not been persisted yet.
///
/// The key is left at its default (`0`) so the database assigns one on insert.
pub fn mock_user_model(user_name: &str) -> entity::app_user::Model {
    entity::app_user::Model {
        id: 0,
        user_name: user_name.to_string(),
        email: format!("{}@example.com", user_name),
        display_name: None,
        password_hash: TEST_PASSWORD_HASH.to_string(),
        created_at: Utc::now().naive_utc(),
    }
}

/// Create a mock user model with an explicitly assigned key.
pub fn mock_user_model_with_id(id: i32, user_name: &str) -> entity::app_user::Model {
    entity::app_user::Model {
        id,
        ..mock_user_model(user_name)
    }
}

/// Create a mock role model that has not been persisted yet.
pub fn mock_role_model(name: &str) -> entity::app_role::Model {
    entity::app_role::Model {
        id: 0,
        name: name.to_string(),
    }
}
