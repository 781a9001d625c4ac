//! Deferred queries over one entity type.
//!
//! A [`QueryView`] is only a description until one of its `fetch_*` methods runs it, which is
//! also when a condition the database cannot execute is reported as
//! [`DataError::QueryTranslation`]. The tracking mode is part of the type: a tracked view
//! yields [`Tracked`] handles attached to the session, an untracked view yields plain copies.

use std::marker::PhantomData;

use sea_orm::{
    sea_query::IntoCondition, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    Related, RelationDef, Select,
};

use crate::server::{
    data::{entity::DbEntity, session::DbSession, tracked::Tracked},
    error::data::DataError,
};

mod sealed {
    pub trait Sealed {}
}

/// Tracking mode of a [`QueryView`].
pub trait TrackingMode: sealed::Sealed + Send + Sync + 'static {}

/// Results are attached to the session; mutations are saved by the next commit.
#[derive(Debug)]
pub struct Tracking;

/// Results are detached copies; mutations are never saved unless passed to `update`.
#[derive(Debug)]
pub struct NoTracking;

impl sealed::Sealed for Tracking {}
impl sealed::Sealed for NoTracking {}
impl TrackingMode for Tracking {}
impl TrackingMode for NoTracking {}

pub struct QueryView<M: DbEntity, T: TrackingMode = NoTracking> {
    session: DbSession,
    select: Select<M::Table>,
    joined: bool,
    _mode: PhantomData<T>,
}

impl<M: DbEntity, T: TrackingMode> QueryView<M, T> {
    pub(crate) fn new(session: DbSession) -> Self {
        Self {
            session,
            select: M::Table::find(),
            joined: false,
            _mode: PhantomData,
        }
    }

    fn with_mode<U: TrackingMode>(self) -> QueryView<M, U> {
        QueryView {
            session: self.session,
            select: self.select,
            joined: self.joined,
            _mode: PhantomData,
        }
    }

    /// Restricts the view to rows matching `condition`.
    pub fn filter<F: IntoCondition>(mut self, condition: F) -> Self {
        self.select = self.select.filter(condition);
        self
    }

    /// Left-joins a related table so conditions may refer to its columns.
    ///
    /// Rows of `M` are de-duplicated, so a parent with many children is returned once.
    pub fn including(mut self, relation: RelationDef) -> Self {
        self.select = self.select.join(JoinType::LeftJoin, relation);
        if !self.joined {
            self.select = self.select.distinct();
            self.joined = true;
        }
        self
    }

    pub fn order_by_asc(mut self, column: <M::Table as EntityTrait>::Column) -> Self {
        self.select = self.select.order_by_asc(column);
        self
    }

    pub fn order_by_desc(mut self, column: <M::Table as EntityTrait>::Column) -> Self {
        self.select = self.select.order_by_desc(column);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.select = self.select.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.select = self.select.offset(offset);
        self
    }

    pub fn no_tracking(self) -> QueryView<M, NoTracking> {
        self.with_mode()
    }

    pub fn with_tracking(self) -> QueryView<M, Tracking> {
        self.with_mode()
    }

    /// Number of rows the view would return.
    pub async fn count(self) -> Result<u64, DataError> {
        self.session.count::<M>(self.select).await
    }
}

impl<M: DbEntity> QueryView<M, Tracking> {
    pub async fn fetch_all(self) -> Result<Vec<Tracked<M>>, DataError> {
        let models = self.session.fetch_all::<M>(self.select).await?;

        self.session.attach_all(models)
    }

    pub async fn fetch_one(self) -> Result<Option<Tracked<M>>, DataError> {
        match self.session.fetch_one::<M>(self.select).await? {
            Some(model) => Ok(Some(self.session.attach(model)?)),
            None => Ok(None),
        }
    }
}

impl<M: DbEntity> QueryView<M, NoTracking> {
    pub async fn fetch_all(self) -> Result<Vec<M>, DataError> {
        self.session.fetch_all::<M>(self.select).await
    }

    pub async fn fetch_one(self) -> Result<Option<M>, DataError> {
        self.session.fetch_one::<M>(self.select).await
    }

    /// Fetches each row together with its related `R` rows.
    pub async fn fetch_with_related<R>(
        self,
        related: R,
    ) -> Result<Vec<(M, Vec<R::Model>)>, DataError>
    where
        R: EntityTrait,
        M::Table: Related<R>,
    {
        self.session
            .fetch_with_related::<M, R>(self.select, related)
            .await
    }
}
