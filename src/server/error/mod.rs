//! Error types for the groundwork server.
//!
//! Each concern (configuration, data access, object mapping) defines its own error enum with
//! `thiserror`; [`Error`] aggregates them so handlers can use the `?` operator throughout. All
//! errors implement `IntoResponse` so they can be returned directly from Axum handlers.

pub mod config;
pub mod data;
pub mod mapping;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    model::api::ErrorDto,
    server::error::{config::ConfigError, data::DataError, mapping::MappingError},
};

/// Main error type for the groundwork server.
///
/// Aggregates the domain-specific error types and external library errors into a single
/// unified error type. The `IntoResponse` implementation maps errors to HTTP responses.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// Data access error raised by a repository, service or unit of work.
    #[error(transparent)]
    DataError(#[from] DataError),
    /// Entity to transport object mapping error.
    #[error(transparent)]
    MappingError(#[from] MappingError),
    /// Internal error indicating a bug in groundwork's code.
    #[error("Internal error with groundwork's code, please report this as it indicates a bug: {0:?}")]
    InternalError(String),
    /// Database error raised outside of a persistence session (connecting, migrating).
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    /// I/O error (binding the listener, serving connections).
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Converts application errors into HTTP responses.
///
/// Data errors carry their own mapping (400 for invalid keys, 409 for concurrent
/// modification); everything else is an internal server error.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::ConfigError(err) => err.into_response(),
            Self::DataError(err) => err.into_response(),
            Self::MappingError(err) => err.into_response(),
            err => InternalServerError(err).into_response(),
        }
    }
}

/// Wrapper type for converting any displayable error into a 500 Internal Server Error response.
///
/// Logs the error message and returns a generic "Internal server error" message to the client
/// to avoid leaking implementation details.
pub struct InternalServerError<E>(pub E);

impl<E: std::fmt::Display> IntoResponse for InternalServerError<E> {
    fn into_response(self) -> Response {
        tracing::error!("{}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorDto {
                error: "Internal server error".to_string(),
            }),
        )
            .into_response()
    }
}
