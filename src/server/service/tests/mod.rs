use groundwork_test_utils::prelude::*;
use sea_orm::{ColumnTrait, Condition};

use crate::server::{
    data::{
        repository::SessionRepository,
        session::DbSession,
        unit_of_work::{SessionUnitOfWork, UnitOfWork},
    },
    model::db::AppUserModel,
    service::db::{DataService, DbService},
};

mod db;
