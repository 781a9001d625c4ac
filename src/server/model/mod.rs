//! Server application models and type definitions.
//!
//! This module contains the application state shared by every handler and the database
//! model type aliases registered with the data layer.

pub mod app;
pub mod db;
