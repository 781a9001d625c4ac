use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::server::mapping::{Mapper, MappingConfiguration};

/// Username the example endpoint looks up when the request does not name one.
pub static DEFAULT_USERNAME: &str = "admin";

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mapper: Arc<Mapper>,
    pub default_username: String,
}

impl AppState {
    pub fn new(db: DatabaseConnection, mapper: Mapper, default_username: String) -> Self {
        Self {
            db,
            mapper: Arc::new(mapper),
            default_username,
        }
    }
}

/// State with the built-in mapping profiles and the default username.
impl From<DatabaseConnection> for AppState {
    fn from(db: DatabaseConnection) -> Self {
        Self::new(
            db,
            MappingConfiguration::configure(Vec::new()),
            DEFAULT_USERNAME.to_string(),
        )
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<Mapper> {
    fn from_ref(state: &AppState) -> Self {
        state.mapper.clone()
    }
}
