//! Generic repository over one entity type.

use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, Condition, RelationDef, Value};

use crate::server::{
    data::{
        entity::{key_from_values, table_name, DbEntity},
        query::{NoTracking, QueryView, Tracking},
        session::DbSession,
        tracked::Tracked,
    },
    error::data::DataError,
};

/// Queries and stages changes for entities of type `M`.
///
/// Staging methods (`insert`, `update`, `delete`, `delete_by_keys`) never write to the
/// database; the changes are persisted by the unit of work sharing the same session. A staging
/// call that fails stages none of its entities.
#[async_trait]
pub trait Repository<M: DbEntity>: Send + Sync {
    /// Untracked view of every row.
    fn all(&self) -> QueryView<M, NoTracking>;

    /// Tracked view of every row.
    fn all_with_track(&self) -> QueryView<M, Tracking>;

    /// Untracked view of every row, left-joining each relation in turn.
    fn all_including(&self, relations: Vec<RelationDef>) -> QueryView<M, NoTracking>;

    /// Tracked view of every row, left-joining each relation in turn.
    fn all_with_track_including(&self, relations: Vec<RelationDef>) -> QueryView<M, Tracking>;

    /// Tracked view filtered by `condition`; call `no_tracking()` for detached results.
    fn find_by(&self, condition: Condition) -> QueryView<M, Tracking>;

    /// Looks the key up in the session first, then in the database.
    async fn find(&self, key: M::Key) -> Result<Option<Tracked<M>>, DataError>;

    /// [`Repository::find`] with loosely typed key arguments.
    ///
    /// Fails with `InvalidKey` unless exactly one value of the key's type is given.
    async fn find_by_values(&self, values: Vec<Value>) -> Result<Option<Tracked<M>>, DataError>;

    /// Already-tracked instance for `key`, without a database round trip.
    fn find_local(&self, key: &M::Key) -> Option<Tracked<M>>;

    /// Stages new entities for insert.
    fn insert(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;

    /// [`Repository::insert`] that first waits for any database round trip in flight on the
    /// session.
    async fn insert_async(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;

    /// Stages the entity of each key for removal, skipping keys with no row.
    ///
    /// Returns the number of entities staged.
    async fn delete_by_keys(&self, keys: Vec<M::Key>) -> Result<usize, DataError>;

    /// Stages the given entities for removal.
    fn delete(&self, entities: Vec<M>) -> Result<(), DataError>;

    /// Stages a full overwrite of every column of the given entities.
    fn update(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;

    /// Stops tracking the entity with `key`, discarding any change staged for it.
    fn detach(&self, key: &M::Key) -> Result<bool, DataError>;
}

/// [`Repository`] bound to a [`DbSession`].
pub struct SessionRepository<M: DbEntity> {
    session: DbSession,
    _entity: PhantomData<fn() -> M>,
}

impl<M: DbEntity> Clone for SessionRepository<M> {
    fn clone(&self) -> Self {
        Self::new(self.session.clone())
    }
}

impl<M: DbEntity> SessionRepository<M> {
    /// Creates a new instance of [`SessionRepository`]
    pub fn new(session: DbSession) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    pub fn session(&self) -> &DbSession {
        &self.session
    }
}

#[async_trait]
impl<M: DbEntity> Repository<M> for SessionRepository<M> {
    fn all(&self) -> QueryView<M, NoTracking> {
        QueryView::new(self.session.clone())
    }

    fn all_with_track(&self) -> QueryView<M, Tracking> {
        QueryView::new(self.session.clone())
    }

    fn all_including(&self, relations: Vec<RelationDef>) -> QueryView<M, NoTracking> {
        relations
            .into_iter()
            .fold(self.all(), |view, relation| view.including(relation))
    }

    fn all_with_track_including(&self, relations: Vec<RelationDef>) -> QueryView<M, Tracking> {
        relations
            .into_iter()
            .fold(self.all_with_track(), |view, relation| view.including(relation))
    }

    fn find_by(&self, condition: Condition) -> QueryView<M, Tracking> {
        self.all_with_track().filter(condition)
    }

    async fn find(&self, key: M::Key) -> Result<Option<Tracked<M>>, DataError> {
        self.session.ensure_open()?;

        if let Some(tracked) = self.session.local::<M>(&key) {
            return Ok(Some(tracked));
        }

        let select = QueryView::<M, Tracking>::new(self.session.clone())
            .filter(ColumnTrait::eq(&M::key_column(), key));

        select.fetch_one().await
    }

    async fn find_by_values(&self, values: Vec<Value>) -> Result<Option<Tracked<M>>, DataError> {
        let key = key_from_values::<M>(values)?;

        self.find(key).await
    }

    fn find_local(&self, key: &M::Key) -> Option<Tracked<M>> {
        self.session.local::<M>(key)
    }

    fn insert(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        let count = entities.len();
        let tracked = self.session.stage_insert(entities)?;

        tracing::debug!("Staged {} {} row(s) for insert", count, table_name::<M>());

        Ok(tracked)
    }

    async fn insert_async(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        self.session.wait_idle().await;

        self.insert(entities)
    }

    async fn delete_by_keys(&self, keys: Vec<M::Key>) -> Result<usize, DataError> {
        // A failed lookup stages none of the keys
        let mut found = Vec::new();

        for key in keys {
            match self.find(key.clone()).await? {
                Some(tracked) => found.push(tracked.get()),
                None => {
                    tracing::debug!(
                        "No {} row with key {:?}, skipping delete",
                        table_name::<M>(),
                        key
                    );
                }
            }
        }

        let staged = found.len();
        self.session.stage_delete(found)?;

        Ok(staged)
    }

    fn delete(&self, entities: Vec<M>) -> Result<(), DataError> {
        self.session.stage_delete(entities)
    }

    fn update(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        self.session.stage_update(entities)
    }

    fn detach(&self, key: &M::Key) -> Result<bool, DataError> {
        self.session.detach::<M>(key)
    }
}
