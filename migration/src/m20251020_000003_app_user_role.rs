use sea_orm_migration::{prelude::*, schema::*};

use crate::{m20251020_000001_app_user::AppUser, m20251020_000002_app_role::AppRole};

static IDX_USER_ROLE_USER_ID: &str = "idx-app_user_role-user_id";
static FK_USER_ROLE_USER_ID: &str = "fk-app_user_role-user_id";
static FK_USER_ROLE_ROLE_ID: &str = "fk-app_user_role-role_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite cannot add foreign keys to an existing table
        manager
            .create_table(
                Table::create()
                    .table(AppUserRole::Table)
                    .if_not_exists()
                    .col(pk_auto(AppUserRole::Id))
                    .col(integer(AppUserRole::UserId))
                    .col(integer(AppUserRole::RoleId))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_USER_ROLE_USER_ID)
                            .from(AppUserRole::Table, AppUserRole::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_USER_ROLE_ROLE_ID)
                            .from(AppUserRole::Table, AppUserRole::RoleId)
                            .to(AppRole::Table, AppRole::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_USER_ROLE_USER_ID)
                    .table(AppUserRole::Table)
                    .col(AppUserRole::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_USER_ROLE_USER_ID)
                    .table(AppUserRole::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AppUserRole::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AppUserRole {
    Table,
    Id,
    UserId,
    RoleId,
}
