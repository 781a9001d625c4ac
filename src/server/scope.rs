//! Request-scoped composition root.
//!
//! The [`request_scope`] middleware creates one [`RequestScope`] per request. Handlers receive
//! repositories, services and the unit of work as extractors, all bound to that scope's
//! session, and the session is disposed once the response has been produced.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;

use crate::server::{
    data::{
        entity::DbEntity, repository::SessionRepository, session::DbSession,
        unit_of_work::SessionUnitOfWork,
    },
    error::Error,
    service::db::DataService,
};

/// Hands out data access components that share one persistence session.
#[derive(Clone)]
pub struct RequestScope {
    session: DbSession,
}

impl RequestScope {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            session: DbSession::new(db),
        }
    }

    pub fn session(&self) -> &DbSession {
        &self.session
    }

    pub fn repository<M: DbEntity>(&self) -> SessionRepository<M> {
        SessionRepository::new(self.session.clone())
    }

    pub fn db_service<M: DbEntity>(&self) -> DataService<M> {
        DataService::new(self.repository())
    }

    pub fn unit_of_work(&self) -> SessionUnitOfWork {
        SessionUnitOfWork::new(self.session.clone())
    }

    /// Rolls back any open transaction and discards uncommitted tracked state.
    pub async fn dispose(&self) {
        self.session.dispose().await
    }
}

/// Middleware creating the [`RequestScope`] of each request and disposing it afterwards.
pub async fn request_scope(
    State(db): State<DatabaseConnection>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = RequestScope::new(db);
    request.extensions_mut().insert(scope.clone());

    let response = next.run(request).await;

    scope.dispose().await;

    response
}

impl<S: Send + Sync> FromRequestParts<S> for RequestScope {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestScope>()
            .cloned()
            .ok_or_else(|| {
                Error::InternalError(
                    "request scope middleware is not installed on this route".to_string(),
                )
            })
    }
}

impl<S: Send + Sync, M: DbEntity> FromRequestParts<S> for SessionRepository<M> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let scope = RequestScope::from_request_parts(parts, state).await?;

        Ok(scope.repository())
    }
}

impl<S: Send + Sync, M: DbEntity> FromRequestParts<S> for DataService<M> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let scope = RequestScope::from_request_parts(parts, state).await?;

        Ok(scope.db_service())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionUnitOfWork {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let scope = RequestScope::from_request_parts(parts, state).await?;

        Ok(scope.unit_of_work())
    }
}
