use tokio_util::sync::CancellationToken;

use super::*;

/// Expect saving with nothing staged to write nothing
#[tokio::test]
async fn save_without_changes_returns_zero() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (_, uow) = scope::<AppUserModel>(&test.db);

    assert_eq!(uow.save_changes().await.unwrap(), 0);

    Ok(())
}

/// Expect the affected row count to cover every staged insert, update and delete
#[tokio::test]
async fn save_returns_total_affected_rows() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    let alice = test.user().insert_user("alice").await?;
    let bob = test.user().insert_user("bob").await?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    users
        .insert(vec![
            factory::mock_user_model("carol"),
            factory::mock_user_model("dave"),
        ])
        .unwrap();
    users
        .update(vec![AppUserModel {
            display_name: Some("Alice".to_string()),
            ..alice
        }])
        .unwrap();
    users.delete(vec![bob]).unwrap();

    assert_eq!(uow.save_changes().await.unwrap(), 4);
    assert_eq!(user_count(&test.db).await, 3);

    Ok(())
}

/// Expect a failed save to write nothing and keep every staged change for a retry
#[tokio::test]
async fn failed_save_is_atomic_and_keeps_state() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    test.user().insert_user("alice").await?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    let tracked = users
        .insert(vec![
            factory::mock_user_model("bob"),
            factory::mock_user_model("alice"),
        ])
        .unwrap();
    let result = uow.save_changes().await;

    assert!(matches!(result, Err(DataError::Persistence(_))));
    assert!(uow.has_changes());
    assert_eq!(user_count(&test.db).await, 1);

    tracked[1].modify(|u| u.user_name = "carol".to_string());

    assert_eq!(uow.save_changes().await.unwrap(), 2);
    assert_eq!(user_count(&test.db).await, 3);

    Ok(())
}

/// Expect ConcurrentModification when the row was deleted after it was read
#[tokio::test]
async fn update_of_removed_row_conflicts() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    let user = test.user().insert_user("alice").await?;
    let (users, uow) = scope::<AppUserModel>(&test.db);
    let (other_users, other_uow) = scope::<AppUserModel>(&test.db);

    let tracked = users.find(user.id).await.unwrap().unwrap();
    other_users.delete_by_keys(vec![user.id]).await.unwrap();
    other_uow.save_changes().await.unwrap();

    tracked.modify(|u| u.user_name = "changed".to_string());
    let result = uow.save_changes().await;

    assert!(matches!(
        result,
        Err(DataError::ConcurrentModification { .. })
    ));
    assert!(uow.has_changes());

    Ok(())
}

/// Expect changes saved inside a committed transaction to be visible to other sessions
#[tokio::test]
async fn commit_makes_saved_changes_durable() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    uow.begin_transaction().await.unwrap();
    assert!(uow.in_transaction().await);

    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    uow.save_changes().await.unwrap();
    uow.commit().await.unwrap();

    assert!(!uow.in_transaction().await);
    assert_eq!(user_count(&test.db).await, 1);

    Ok(())
}

/// Expect reads inside an open transaction to see its uncommitted writes
#[tokio::test]
async fn reads_see_uncommitted_writes_of_own_transaction() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    uow.begin_transaction().await.unwrap();
    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    uow.save_changes().await.unwrap();

    assert_eq!(users.all().count().await.unwrap(), 1);

    uow.rollback().await.unwrap();

    Ok(())
}

/// Expect rolling back a transaction to discard changes saved inside it
#[tokio::test]
async fn rollback_discards_saved_changes() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    uow.begin_transaction().await.unwrap();
    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    assert_eq!(uow.save_changes().await.unwrap(), 1);
    uow.rollback().await.unwrap();

    assert_eq!(user_count(&test.db).await, 0);

    Ok(())
}

/// Expect TransactionAlreadyOpen when beginning a second transaction
#[tokio::test]
async fn rejects_nested_begin() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (_, uow) = scope::<AppUserModel>(&test.db);

    uow.begin_transaction().await.unwrap();
    let result = uow.begin_transaction().await;

    assert!(matches!(result, Err(DataError::TransactionAlreadyOpen)));
    assert!(uow.in_transaction().await);

    uow.rollback().await.unwrap();

    Ok(())
}

/// Expect commit and rollback without an open transaction to do nothing
#[tokio::test]
async fn commit_and_rollback_without_transaction_are_noops() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (_, uow) = scope::<AppUserModel>(&test.db);

    assert!(uow.commit().await.is_ok());
    assert!(uow.rollback().await.is_ok());

    Ok(())
}

/// Expect dispose to be idempotent and every later operation to fail with Disposed
#[tokio::test]
async fn dispose_is_idempotent() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    uow.dispose().await;
    uow.dispose().await;

    assert!(!uow.has_changes());
    assert!(matches!(
        uow.save_changes().await,
        Err(DataError::Disposed)
    ));
    assert!(matches!(
        users.all().fetch_all().await,
        Err(DataError::Disposed)
    ));
    assert!(matches!(
        users.insert(vec![factory::mock_user_model("bob")]),
        Err(DataError::Disposed)
    ));

    Ok(())
}

/// Expect dispose to roll back a transaction left open
#[tokio::test]
async fn dispose_rolls_back_open_transaction() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);

    uow.begin_transaction().await.unwrap();
    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    uow.save_changes().await.unwrap();
    uow.dispose().await;

    assert_eq!(user_count(&test.db).await, 0);

    Ok(())
}

/// Expect a cancelled save to return Cancelled and keep the staged changes
#[tokio::test]
async fn cancelled_save_keeps_changes() -> Result<(), TestError> {
    let test = test_setup_with_user_tables!()?;
    let (users, uow) = scope::<AppUserModel>(&test.db);
    let cancel = CancellationToken::new();

    users
        .insert(vec![factory::mock_user_model("alice")])
        .unwrap();
    cancel.cancel();
    let result = uow.save_changes_with_cancel(&cancel).await;

    assert!(matches!(result, Err(DataError::Cancelled)));
    assert!(uow.has_changes());
    assert_eq!(user_count(&test.db).await, 0);

    let result = uow.save_changes_with_cancel(&CancellationToken::new()).await;

    assert!(matches!(result, Ok(1)));

    Ok(())
}
