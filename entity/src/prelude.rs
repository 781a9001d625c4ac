pub use super::app_role::Entity as AppRole;
pub use super::app_user::Entity as AppUser;
pub use super::app_user_role::Entity as AppUserRole;
