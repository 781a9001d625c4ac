//! Declarative test builder.
//!
//! This module provides the `TestBuilder` API for configuring test environments before execution.
//! The builder pattern allows chaining multiple configuration methods together, with all operations
//! queued and executed during the final `build()` call.

use sea_orm::{sea_query::TableCreateStatement, EntityTrait, Schema};

use crate::{error::TestError, TestSetup};

/// Builder for declarative test initialization.
///
/// Provides an interface for setting up test environments with database tables and
/// user/role fixtures. Methods can be chained together and finalized with `build()`.
#[derive(Default)]
pub struct TestBuilder {
    // Tables to create
    tables: Vec<TableCreateStatement>,
    include_user_tables: bool,

    // Database fixtures to insert
    users: Vec<String>,
    roles: Vec<String>,
    user_roles: Vec<(String, String)>, // (user_name, role_name)
}

impl TestBuilder {
    /// Create a new TestBuilder.
    ///
    /// Initializes an empty builder with no tables or fixtures configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the `app_user`, `app_role` and `app_user_role` tables to the test database.
    pub fn with_user_tables(mut self) -> Self {
        self.include_user_tables = true;
        self
    }

    /// Add a custom entity table to the test database.
    ///
    /// Generates a CREATE TABLE statement for the entity, which will be executed during `build()`.
    /// Chain multiple calls to add multiple tables.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use groundwork_test_utils::TestBuilder;
    /// use entity::prelude::*;
    ///
    /// # async fn example() -> Result<(), groundwork_test_utils::TestError> {
    /// let test = TestBuilder::new()
    ///     .with_table(AppUser)
    ///     .with_table(AppRole)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_table<E: EntityTrait>(mut self, entity: E) -> Self {
        let schema = Schema::new(sea_orm::DbBackend::Sqlite);
        self.tables.push(schema.create_table_from_entity(entity));
        self
    }

    /// Insert a user with the given username during `build()`.
    ///
    /// Implies `with_user_tables()`.
    pub fn with_user(mut self, user_name: &str) -> Self {
        self.include_user_tables = true;
        self.users.push(user_name.to_string());
        self
    }

    /// Insert a role with the given name during `build()`.
    ///
    /// Implies `with_user_tables()`.
    pub fn with_role(mut self, name: &str) -> Self {
        self.include_user_tables = true;
        self.roles.push(name.to_string());
        self
    }

    /// Assign a role to a user during `build()`.
    ///
    /// Both the user and the role must be added to the builder as well.
    pub fn with_user_role(mut self, user_name: &str, role_name: &str) -> Self {
        self.user_roles
            .push((user_name.to_string(), role_name.to_string()));
        self
    }

    /// Build the test setup.
    ///
    /// Creates the database, then the tables, then inserts users and roles, then the
    /// role assignments.
    ///
    /// # Returns
    /// - `Ok(TestSetup)` - Fully initialized test environment
    /// - `Err(TestError::DbErr)` - Table creation or fixture insertion failed
    /// - `Err(TestError::UnknownFixture)` - A role assignment names a user or role that was not added
    pub async fn build(self) -> Result<TestSetup, TestError> {
        let mut setup = TestSetup::new().await?;

        let mut tables = Vec::new();
        if self.include_user_tables {
            let schema = Schema::new(sea_orm::DbBackend::Sqlite);
            tables.push(schema.create_table_from_entity(entity::prelude::AppUser));
            tables.push(schema.create_table_from_entity(entity::prelude::AppRole));
            tables.push(schema.create_table_from_entity(entity::prelude::AppUserRole));
        }
        tables.extend(self.tables);
        setup.with_tables(tables).await?;

        let mut users = Vec::new();
        for user_name in &self.users {
            users.push(setup.user().insert_user(user_name).await?);
        }

        let mut roles = Vec::new();
        for name in &self.roles {
            roles.push(setup.user().insert_role(name).await?);
        }

        for (user_name, role_name) in &self.user_roles {
            let user = users
                .iter()
                .find(|u| &u.user_name == user_name)
                .ok_or_else(|| TestError::UnknownFixture {
                    kind: "user",
                    name: user_name.clone(),
                })?;
            let role = roles
                .iter()
                .find(|r| &r.name == role_name)
                .ok_or_else(|| TestError::UnknownFixture {
                    kind: "role",
                    name: role_name.clone(),
                })?;

            setup.user().assign_role(user.id, role.id).await?;
        }

        Ok(setup)
    }
}
