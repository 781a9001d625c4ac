//! Helpers for driving the router in integration tests.

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
};
use groundwork::server::{model::app::AppState, router::routes};
use groundwork_test_utils::TestSetup;
use tower::ServiceExt;

/// Sends a GET request for `uri` through the full router, middleware included.
pub async fn get(test: &TestSetup, uri: &str) -> Response {
    let app = routes(test.state::<AppState>());

    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    String::from_utf8(bytes.to_vec()).unwrap()
}
