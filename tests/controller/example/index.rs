//! Tests for the username lookup endpoint.

use super::*;

/// Expect the default username to be looked up when none is given
///
/// Expected: 200 OK with the username as plain text
#[tokio::test]
async fn returns_default_username() -> Result<(), TestError> {
    let test = TestBuilder::new().with_user("admin").build().await?;

    let response = get(&test, "/api/example").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "admin");

    Ok(())
}

/// Expect the username from the query string to be looked up
#[tokio::test]
async fn returns_requested_username() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_user("admin")
        .with_user("alice")
        .build()
        .await?;

    let response = get(&test, "/api/example?username=alice").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "alice");

    Ok(())
}

/// Expect 404 with "Not found" when no user has the username
#[tokio::test]
async fn not_found_for_unknown_username() -> Result<(), TestError> {
    let test = TestBuilder::new().with_user("alice").build().await?;

    let response = get(&test, "/api/example").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Not found");

    Ok(())
}

/// Expect 500 when the user tables have not been created
#[tokio::test]
async fn internal_error_without_tables() -> Result<(), TestError> {
    let test = test_setup_with_tables!()?;

    let response = get(&test, "/api/example").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    Ok(())
}
