use groundwork_test_utils::prelude::*;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};

use crate::server::{
    data::{
        entity::DbEntity,
        repository::{Repository, SessionRepository},
        session::DbSession,
        unit_of_work::{SessionUnitOfWork, UnitOfWork},
    },
    error::data::DataError,
    model::db::AppUserModel,
};

mod unit_of_work;

/// Repository and unit of work sharing a fresh session.
fn scope<M: DbEntity>(db: &DatabaseConnection) -> (SessionRepository<M>, SessionUnitOfWork) {
    let session = DbSession::new(db.clone());

    (
        SessionRepository::new(session.clone()),
        SessionUnitOfWork::new(session),
    )
}

/// Number of users in the database, read through a fresh session.
async fn user_count(db: &DatabaseConnection) -> u64 {
    let (users, _) = scope::<AppUserModel>(db);

    users.all().count().await.unwrap()
}

fn user_name_is(user_name: &str) -> Condition {
    Condition::all().add(entity::app_user::Column::UserName.eq(user_name))
}
