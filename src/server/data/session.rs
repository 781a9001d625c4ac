//! Persistence session shared by the repositories and unit of work of one scope.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use sea_orm::{
    DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, Related, Select,
    TransactionTrait,
};
use tokio_util::sync::CancellationToken;

use crate::server::{
    data::{
        entity::{table_name, DbEntity},
        tracked::Tracked,
        tracker::ChangeTracker,
    },
    error::data::DataError,
};

/// Runs `$body` against the open transaction if there is one, otherwise the connection.
macro_rules! with_connection {
    ($io:expr, |$conn:ident| $body:expr) => {
        match &$io.transaction {
            Some($conn) => $body,
            None => {
                let $conn = &$io.db;
                $body
            }
        }
    };
}

struct SessionIo {
    db: DatabaseConnection,
    transaction: Option<DatabaseTransaction>,
}

struct SessionInner {
    /// Serializes database round trips made through this session.
    io: tokio::sync::Mutex<SessionIo>,
    tracker: Mutex<ChangeTracker>,
    disposed: AtomicBool,
}

/// One database connection handle, an optional explicit transaction and a change tracker.
///
/// Cloning a session is cheap and every clone shares the same state, which is how the
/// repositories and the unit of work of one request scope observe each other's work.
#[derive(Clone)]
pub struct DbSession {
    inner: Arc<SessionInner>,
}

impl DbSession {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                io: tokio::sync::Mutex::new(SessionIo {
                    db,
                    transaction: None,
                }),
                tracker: Mutex::new(ChangeTracker::default()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    fn tracker(&self) -> MutexGuard<'_, ChangeTracker> {
        self.inner
            .tracker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), DataError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(DataError::Disposed);
        }

        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub(crate) async fn fetch_all<M: DbEntity>(
        &self,
        select: Select<M::Table>,
    ) -> Result<Vec<M>, DataError> {
        self.ensure_open()?;
        let io = self.inner.io.lock().await;

        with_connection!(io, |conn| select.all(conn).await)
            .map_err(|err| DataError::from_query(table_name::<M>(), err))
    }

    pub(crate) async fn fetch_one<M: DbEntity>(
        &self,
        select: Select<M::Table>,
    ) -> Result<Option<M>, DataError> {
        self.ensure_open()?;
        let io = self.inner.io.lock().await;

        with_connection!(io, |conn| select.one(conn).await)
            .map_err(|err| DataError::from_query(table_name::<M>(), err))
    }

    pub(crate) async fn count<M: DbEntity>(
        &self,
        select: Select<M::Table>,
    ) -> Result<u64, DataError> {
        self.ensure_open()?;
        let io = self.inner.io.lock().await;

        with_connection!(io, |conn| select.count(conn).await)
            .map_err(|err| DataError::from_query(table_name::<M>(), err))
    }

    pub(crate) async fn fetch_with_related<M, R>(
        &self,
        select: Select<M::Table>,
        related: R,
    ) -> Result<Vec<(M, Vec<R::Model>)>, DataError>
    where
        M: DbEntity,
        M::Table: Related<R>,
        R: EntityTrait,
    {
        self.ensure_open()?;
        let io = self.inner.io.lock().await;

        with_connection!(io, |conn| select
            .find_with_related(related)
            .all(conn)
            .await)
        .map_err(|err| DataError::from_query(table_name::<M>(), err))
    }

    /// Waits until no database round trip is in flight on this session.
    pub(crate) async fn wait_idle(&self) {
        drop(self.inner.io.lock().await);
    }

    pub(crate) fn attach<M: DbEntity>(&self, model: M) -> Result<Tracked<M>, DataError> {
        let mut tracker = self.tracker();
        let seq = tracker.next_seq();

        Ok(tracker.set_mut::<M>()?.attach(seq, model))
    }

    pub(crate) fn attach_all<M: DbEntity>(
        &self,
        models: Vec<M>,
    ) -> Result<Vec<Tracked<M>>, DataError> {
        let mut tracker = self.tracker();
        let seq = tracker.next_seq();
        let set = tracker.set_mut::<M>()?;

        Ok(models
            .into_iter()
            .map(|model| set.attach(seq, model))
            .collect())
    }

    pub(crate) fn local<M: DbEntity>(&self, key: &M::Key) -> Option<Tracked<M>> {
        self.tracker().set::<M>().and_then(|set| set.local(key))
    }

    /// Stages every entity for insert, or none of them if any would conflict.
    pub(crate) fn stage_insert<M: DbEntity>(
        &self,
        models: Vec<M>,
    ) -> Result<Vec<Tracked<M>>, DataError> {
        self.ensure_open()?;
        let mut tracker = self.tracker();
        let seqs = tracker.next_seqs(models.len());
        let set = tracker.set_mut::<M>()?;
        set.check_insert(&models)?;

        models
            .into_iter()
            .zip(seqs)
            .map(|(model, seq)| set.stage_insert(seq, model))
            .collect()
    }

    pub(crate) fn stage_update<M: DbEntity>(
        &self,
        models: Vec<M>,
    ) -> Result<Vec<Tracked<M>>, DataError> {
        self.ensure_open()?;
        let mut tracker = self.tracker();
        let seqs = tracker.next_seqs(models.len());
        let set = tracker.set_mut::<M>()?;

        models
            .into_iter()
            .zip(seqs)
            .map(|(model, seq)| set.stage_update(seq, model))
            .collect()
    }

    /// Stages every entity for removal, or none of them if any has no key.
    pub(crate) fn stage_delete<M: DbEntity>(&self, models: Vec<M>) -> Result<(), DataError> {
        self.ensure_open()?;
        let mut tracker = self.tracker();
        let seqs = tracker.next_seqs(models.len());
        let set = tracker.set_mut::<M>()?;
        set.check_delete(&models)?;

        for (model, seq) in models.into_iter().zip(seqs) {
            set.stage_delete(seq, model)?;
        }

        Ok(())
    }

    pub(crate) fn detach<M: DbEntity>(&self, key: &M::Key) -> Result<bool, DataError> {
        Ok(self.tracker().set_mut::<M>()?.detach(key))
    }

    pub fn has_changes(&self) -> bool {
        self.tracker().has_changes()
    }

    pub async fn in_transaction(&self) -> bool {
        self.inner.io.lock().await.transaction.is_some()
    }

    /// Writes every staged change in one transaction, or in a savepoint when an explicit
    /// transaction is open, and returns the number of affected rows.
    ///
    /// On failure nothing is written and the tracked state is left untouched.
    pub async fn save_changes(&self) -> Result<u64, DataError> {
        self.ensure_open()?;
        let io = self.inner.io.lock().await;

        let mut writes = self.tracker().plan();
        if writes.is_empty() {
            tracing::debug!("No staged changes to save");
            return Ok(0);
        }

        let txn = match &io.transaction {
            Some(outer) => outer.begin().await,
            None => io.db.begin().await,
        }
        .map_err(DataError::Persistence)?;

        let mut affected = 0;
        for write in writes.iter_mut() {
            match write.execute(&txn).await {
                Ok(rows) => affected += rows,
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        tracing::warn!("Failed to roll back failed save: {}", rollback_err);
                    }

                    return Err(err);
                }
            }
        }

        txn.commit().await.map_err(DataError::Persistence)?;

        let mut tracker = self.tracker();
        for write in writes {
            write.accept(&mut tracker)?;
        }

        tracing::debug!(affected, "Saved staged changes");

        Ok(affected)
    }

    /// [`DbSession::save_changes`] that stops when `cancel` fires.
    ///
    /// A save cancelled before its commit is sent writes nothing and keeps the tracked state.
    pub async fn save_changes_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<u64, DataError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Save cancelled, staged changes are kept");
                Err(DataError::Cancelled)
            }
            result = self.save_changes() => result,
        }
    }

    pub async fn begin_transaction(&self) -> Result<(), DataError> {
        self.ensure_open()?;
        let mut io = self.inner.io.lock().await;

        if io.transaction.is_some() {
            return Err(DataError::TransactionAlreadyOpen);
        }

        let txn = io.db.begin().await.map_err(DataError::Connection)?;
        io.transaction = Some(txn);

        tracing::debug!("Opened explicit transaction");

        Ok(())
    }

    pub async fn commit(&self) -> Result<(), DataError> {
        self.ensure_open()?;
        let mut io = self.inner.io.lock().await;

        if let Some(txn) = io.transaction.take() {
            txn.commit().await.map_err(DataError::Persistence)?;
            tracing::debug!("Committed explicit transaction");
        }

        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DataError> {
        self.ensure_open()?;
        let mut io = self.inner.io.lock().await;

        if let Some(txn) = io.transaction.take() {
            txn.rollback().await.map_err(DataError::Persistence)?;
            tracing::debug!("Rolled back explicit transaction");
        }

        Ok(())
    }

    /// Rolls back any open transaction and discards all tracked state.
    ///
    /// Calling it again does nothing; every other operation fails with `Disposed` afterwards.
    pub async fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut io = self.inner.io.lock().await;
        if let Some(txn) = io.transaction.take() {
            tracing::warn!("Rolling back transaction left open when the session was disposed");

            if let Err(err) = txn.rollback().await {
                tracing::warn!("Failed to roll back transaction on dispose: {}", err);
            }
        }

        self.tracker().clear();
    }
}
