//! Tests for the user lookup by ID endpoint.

use groundwork::model::{api::ErrorDto, user::UserDto};

use super::*;

/// Expect the user and their roles to be returned as JSON
#[tokio::test]
async fn returns_user_with_roles() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_user("alice")
        .with_role("admin")
        .with_role("editor")
        .with_user_role("alice", "editor")
        .build()
        .await?;

    let response = get(&test, "/api/example/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let dto: UserDto = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(dto.id, 1);
    assert_eq!(dto.user_name, "alice");
    assert_eq!(dto.roles.len(), 1);
    assert_eq!(dto.roles[0].name, "editor");

    Ok(())
}

/// Expect 404 when no user has the ID
#[tokio::test]
async fn not_found_for_unknown_id() -> Result<(), TestError> {
    let test = TestBuilder::new().with_user_tables().build().await?;

    let response = get(&test, "/api/example/42").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

/// Expect 400 when the ID is not a valid key
#[tokio::test]
async fn bad_request_for_malformed_id() -> Result<(), TestError> {
    let test = TestBuilder::new().with_user_tables().build().await?;

    let response = get(&test, "/api/example/abc").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorDto = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(error.error.starts_with("Invalid key for app_user:"));

    Ok(())
}

/// Expect the OpenAPI document to describe the example routes
#[tokio::test]
async fn serves_openapi_document() -> Result<(), TestError> {
    let test = TestBuilder::new().with_user_tables().build().await?;

    let response = get(&test, "/api/docs/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("/api/example"));
    assert!(body.contains("/api/example/{id}"));

    Ok(())
}
