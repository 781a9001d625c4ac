//! Tests for the request-scoped composition root.

use groundwork::server::{
    data::{repository::Repository, unit_of_work::UnitOfWork},
    model::db::AppUserModel,
    scope::RequestScope,
    service::db::DbService,
};
use groundwork_test_utils::prelude::*;

/// Expect the services and unit of work of one scope to share a session
#[tokio::test]
async fn components_share_session() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let scope = RequestScope::new(test.db.clone());
    let users = scope.db_service::<AppUserModel>();
    let uow = scope.unit_of_work();

    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();

    assert!(uow.has_changes());
    assert_eq!(uow.save_changes().await.unwrap(), 1);

    let other = RequestScope::new(test.db.clone()).repository::<AppUserModel>();
    assert_eq!(other.all().count().await.unwrap(), 1);

    Ok(())
}

/// Expect changes left unsaved when a scope is disposed to be discarded
#[tokio::test]
async fn dispose_discards_unsaved_changes() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let scope = RequestScope::new(test.db.clone());

    scope
        .repository::<AppUserModel>()
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    scope.dispose().await;

    assert!(!scope.unit_of_work().has_changes());
    assert!(scope.session().is_disposed());

    let fresh = RequestScope::new(test.db.clone());
    assert_eq!(
        fresh.repository::<AppUserModel>().all().count().await.unwrap(),
        0
    );

    Ok(())
}

/// Expect separate scopes to track separate instances of the same row
#[tokio::test]
async fn scopes_do_not_share_identity() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    let user = test.user().insert_user("alice").await?;

    let first = RequestScope::new(test.db.clone())
        .repository::<AppUserModel>()
        .find(user.id)
        .await
        .unwrap()
        .unwrap();
    let second = RequestScope::new(test.db.clone())
        .repository::<AppUserModel>()
        .find(user.id)
        .await
        .unwrap()
        .unwrap();

    assert!(!first.ptr_eq(&second));

    Ok(())
}
