//! Server-side components of groundwork.
//!
//! - `data` - generic repository, unit of work and the persistence session behind them
//! - `service` - services handed to controllers
//! - `scope` - request-scoped composition root and its extractors
//! - `mapping` - entity to transport object conversions
//! - `controller` / `router` - HTTP endpoints and their OpenAPI documentation
//! - `config` / `startup` / `error` - configuration, initialization and error types

pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod mapping;
pub mod model;
pub mod router;
pub mod scope;
pub mod service;
pub mod startup;
