use chrono::Utc;
use sea_orm::{ActiveValue, EntityTrait};

use crate::{constant::TEST_PASSWORD_HASH, error::TestError, TestSetup};

impl TestSetup {
    pub fn user<'a>(&'a mut self) -> UserFixtures<'a> {
        UserFixtures { setup: self }
    }
}

pub struct UserFixtures<'a> {
    setup: &'a mut TestSetup,
}

impl<'a> UserFixtures<'a> {
    /// Insert a user with the given username and a derived email address.
    pub async fn insert_user(&self, user_name: &str) -> Result<entity::app_user::Model, TestError> {
        Ok(
            entity::prelude::AppUser::insert(entity::app_user::ActiveModel {
                user_name: ActiveValue::Set(user_name.to_string()),
                email: ActiveValue::Set(format!("{}@example.com", user_name)),
                display_name: ActiveValue::Set(None),
                password_hash: ActiveValue::Set(TEST_PASSWORD_HASH.to_string()),
                created_at: ActiveValue::Set(Utc::now().naive_utc()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    pub async fn insert_role(&self, name: &str) -> Result<entity::app_role::Model, TestError> {
        Ok(
            entity::prelude::AppRole::insert(entity::app_role::ActiveModel {
                name: ActiveValue::Set(name.to_string()),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    pub async fn assign_role(
        &self,
        user_id: i32,
        role_id: i32,
    ) -> Result<entity::app_user_role::Model, TestError> {
        Ok(
            entity::prelude::AppUserRole::insert(entity::app_user_role::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                role_id: ActiveValue::Set(role_id),
                ..Default::default()
            })
            .exec_with_returning(&self.setup.db)
            .await?,
        )
    }

    /// Insert a user and assign each of the given roles, creating the roles first.
    pub async fn insert_user_with_roles(
        &self,
        user_name: &str,
        role_names: &[&str],
    ) -> Result<(entity::app_user::Model, Vec<entity::app_role::Model>), TestError> {
        let user = self.insert_user(user_name).await?;

        let mut roles = Vec::new();
        for name in role_names {
            let role = self.insert_role(name).await?;
            self.assign_role(user.id, role.id).await?;
            roles.push(role);
        }

        Ok((user, roles))
    }
}
