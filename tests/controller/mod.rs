//! Tests for HTTP controller endpoints.
//!
//! These tests send requests through the complete router so the request scope middleware
//! and the extractors it backs are exercised along with the handlers.

mod example;

use axum::http::StatusCode;
use groundwork_test_utils::prelude::*;

use crate::util::{body_text, get};
