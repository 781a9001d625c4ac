pub use sea_orm_migration::prelude::*;

mod m20251020_000001_app_user;
mod m20251020_000002_app_role;
mod m20251020_000003_app_user_role;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_app_user::Migration),
            Box::new(m20251020_000002_app_role::Migration),
            Box::new(m20251020_000003_app_user_role::Migration),
        ]
    }
}
