use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::server::error::InternalServerError;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("No mapping registered from {from} to {to}")]
    MissingMap {
        from: &'static str,
        to: &'static str,
    },
    #[error("Mapping from {from} to {to} produced a value of the wrong type")]
    TypeMismatch {
        from: &'static str,
        to: &'static str,
    },
}

impl IntoResponse for MappingError {
    fn into_response(self) -> Response {
        InternalServerError(self).into_response()
    }
}
