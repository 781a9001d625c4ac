use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{Condition, RelationDef, Value};

use crate::server::{
    data::{
        entity::DbEntity,
        query::{NoTracking, QueryView, Tracking},
        repository::{Repository, SessionRepository},
        tracked::Tracked,
    },
    error::data::DataError,
};

/// Entity service handed to controllers.
///
/// Every operation forwards to the wrapped [`Repository`] with the same contract; entity
/// specific services build on this one rather than on the repository directly.
#[async_trait]
pub trait DbService<M: DbEntity>: Send + Sync {
    fn repository(&self) -> &dyn Repository<M>;

    fn all(&self) -> QueryView<M, NoTracking>;

    fn all_with_track(&self) -> QueryView<M, Tracking>;

    fn all_including(&self, relations: Vec<RelationDef>) -> QueryView<M, NoTracking>;

    fn all_with_track_including(&self, relations: Vec<RelationDef>) -> QueryView<M, Tracking>;

    fn find_by(&self, condition: Condition) -> QueryView<M, Tracking>;

    async fn find(&self, key: M::Key) -> Result<Option<Tracked<M>>, DataError>;

    async fn find_by_values(&self, values: Vec<Value>) -> Result<Option<Tracked<M>>, DataError>;

    fn insert(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;

    async fn insert_async(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;

    async fn delete_by_keys(&self, keys: Vec<M::Key>) -> Result<usize, DataError>;

    fn delete(&self, entities: Vec<M>) -> Result<(), DataError>;

    fn update(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError>;
}

/// [`DbService`] over any repository, by default the session-bound one.
pub struct DataService<M: DbEntity, R: Repository<M> = SessionRepository<M>> {
    repository: R,
    _entity: PhantomData<fn() -> M>,
}

impl<M: DbEntity, R: Repository<M> + Clone> Clone for DataService<M, R> {
    fn clone(&self) -> Self {
        Self::new(self.repository.clone())
    }
}

impl<M: DbEntity, R: Repository<M>> DataService<M, R> {
    /// Creates a new instance of [`DataService`]
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<M: DbEntity, R: Repository<M>> DbService<M> for DataService<M, R> {
    fn repository(&self) -> &dyn Repository<M> {
        &self.repository
    }

    fn all(&self) -> QueryView<M, NoTracking> {
        self.repository.all()
    }

    fn all_with_track(&self) -> QueryView<M, Tracking> {
        self.repository.all_with_track()
    }

    fn all_including(&self, relations: Vec<RelationDef>) -> QueryView<M, NoTracking> {
        self.repository.all_including(relations)
    }

    fn all_with_track_including(&self, relations: Vec<RelationDef>) -> QueryView<M, Tracking> {
        self.repository.all_with_track_including(relations)
    }

    fn find_by(&self, condition: Condition) -> QueryView<M, Tracking> {
        self.repository.find_by(condition)
    }

    async fn find(&self, key: M::Key) -> Result<Option<Tracked<M>>, DataError> {
        self.repository.find(key).await
    }

    async fn find_by_values(&self, values: Vec<Value>) -> Result<Option<Tracked<M>>, DataError> {
        self.repository.find_by_values(values).await
    }

    fn insert(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        self.repository.insert(entities)
    }

    async fn insert_async(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        self.repository.insert_async(entities).await
    }

    async fn delete_by_keys(&self, keys: Vec<M::Key>) -> Result<usize, DataError> {
        self.repository.delete_by_keys(keys).await
    }

    fn delete(&self, entities: Vec<M>) -> Result<(), DataError> {
        self.repository.delete(entities)
    }

    fn update(&self, entities: Vec<M>) -> Result<Vec<Tracked<M>>, DataError> {
        self.repository.update(entities)
    }
}
