//! HTTP controller endpoints for the groundwork web API.
//!
//! Controllers receive their services through extractors bound to the request scope, call
//! them, map the results to transport objects and return HTTP responses. They use utoipa for
//! OpenAPI documentation.

pub mod example;
