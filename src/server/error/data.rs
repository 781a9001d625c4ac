//! Errors raised by the repository, unit of work and persistence session.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::{model::api::ErrorDto, server::error::InternalServerError};

/// Failure of a data access operation.
///
/// A lookup that finds nothing is not an error: `find` and `fetch_one` return `Ok(None)`
/// and the caller decides how to handle the absence.
#[derive(Error, Debug)]
pub enum DataError {
    /// Key arguments of the wrong count or type, or an entity without an assigned key.
    #[error("Invalid key for {entity}: {reason}")]
    InvalidKey { entity: String, reason: String },
    /// A query condition could not be executed by the backing store.
    ///
    /// Raised when the query view is enumerated, never when the condition is built.
    #[error("Failed to translate query against {entity}: {source}")]
    QueryTranslation {
        entity: String,
        #[source]
        source: DbErr,
    },
    /// Commit-time failure such as a constraint violation or lost connection.
    ///
    /// Nothing from the failed call is committed and the tracked state is left as it was.
    #[error("Failed to persist changes: {0}")]
    Persistence(#[source] DbErr),
    /// An update or delete matched no row, so the row was changed or removed elsewhere.
    #[error("{entity} with key {key} was modified or deleted by another operation")]
    ConcurrentModification { entity: String, key: String },
    /// The backing store could not be reached while reading.
    #[error("Database connection error: {0}")]
    Connection(#[source] DbErr),
    /// An entity with the same assigned key is already tracked by the session.
    #[error("{entity} with key {key} is already tracked by this session")]
    IdentityConflict { entity: String, key: String },
    #[error("A transaction is already open for this session")]
    TransactionAlreadyOpen,
    #[error("The persistence session has been disposed")]
    Disposed,
    #[error("Saving changes was cancelled before it completed")]
    Cancelled,
    /// Internal error indicating a bug in the data layer.
    #[error("Internal data layer error, please report this as a bug: {0}")]
    Internal(String),
}

impl DataError {
    /// Classifies an error returned while enumerating a query view.
    pub(crate) fn from_query(entity: String, err: DbErr) -> Self {
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Connection(err),
            source => Self::QueryTranslation { entity, source },
        }
    }
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidKey { .. } => {
                tracing::debug!("{}", self);

                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorDto {
                        error: self.to_string(),
                    }),
                )
                    .into_response()
            }
            Self::ConcurrentModification { .. } => {
                tracing::debug!("{}", self);

                (
                    StatusCode::CONFLICT,
                    Json(ErrorDto {
                        error: "The resource was changed by another request, please retry."
                            .to_string(),
                    }),
                )
                    .into_response()
            }
            err => InternalServerError(err).into_response(),
        }
    }
}
