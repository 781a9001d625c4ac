use super::*;

/// Expect the service and the repository it wraps to share the session's identity map
#[tokio::test]
async fn exposes_wrapped_repository() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    let user = test.user().insert_user("alice").await?;
    let session = DbSession::new(test.db.clone());
    let service: DataService<AppUserModel> =
        DataService::new(SessionRepository::new(session.clone()));

    let found = service.find(user.id).await.unwrap().unwrap();
    let local = service.repository().find_local(&user.id).unwrap();

    assert!(found.ptr_eq(&local));

    Ok(())
}

/// Expect changes staged through the service to be committed by the session's unit of work
#[tokio::test]
async fn stages_changes_for_unit_of_work() -> Result<(), TestError> {
    let mut test = test_setup_with_user_tables!()?;
    let alice = test.user().insert_user("alice").await?;
    let session = DbSession::new(test.db.clone());
    let service: DataService<AppUserModel> =
        DataService::new(SessionRepository::new(session.clone()));
    let uow = SessionUnitOfWork::new(session);

    service
        .insert_async(vec![factory::mock_user_model("bob")])
        .await
        .unwrap();
    let deleted = service.delete_by_keys(vec![alice.id]).await.unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(uow.save_changes().await.unwrap(), 2);

    let remaining = service.all().fetch_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_name, "bob");

    Ok(())
}

/// Expect service queries to behave like the repository's
#[tokio::test]
async fn forwards_queries() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_user("alice")
        .with_user("bob")
        .build()
        .await?;
    let service: DataService<AppUserModel> =
        DataService::new(SessionRepository::new(DbSession::new(test.db.clone())));

    let bob = service
        .find_by(Condition::all().add(entity::app_user::Column::UserName.eq("bob")))
        .fetch_one()
        .await
        .unwrap();
    let all = service.all_with_track().count().await.unwrap();

    assert!(bob.is_some());
    assert_eq!(all, 2);

    Ok(())
}
