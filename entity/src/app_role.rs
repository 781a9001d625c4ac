use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, Default, DeriveEntityModel)]
#[sea_orm(table_name = "app_role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::app_user_role::Entity")]
    AppUserRole,
}

impl Related<super::app_user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppUserRole.def()
    }
}

impl Related<super::app_user::Entity> for Entity {
    fn to() -> RelationDef {
        super::app_user_role::Relation::AppUser.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::app_user_role::Relation::AppRole.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
