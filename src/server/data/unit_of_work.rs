use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::server::{data::session::DbSession, error::data::DataError};

/// Commits the changes staged by the repositories sharing a session, with optional explicit
/// transaction demarcation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Writes every staged change atomically and returns the number of affected rows.
    async fn save_changes(&self) -> Result<u64, DataError>;

    /// [`UnitOfWork::save_changes`] that returns `Cancelled` when `cancel` fires first.
    async fn save_changes_with_cancel(&self, cancel: &CancellationToken)
        -> Result<u64, DataError>;

    /// Fails with `TransactionAlreadyOpen` if a transaction is already open.
    async fn begin_transaction(&self) -> Result<(), DataError>;

    /// Commits the open transaction; does nothing if none is open.
    async fn commit(&self) -> Result<(), DataError>;

    /// Rolls back the open transaction; does nothing if none is open.
    async fn rollback(&self) -> Result<(), DataError>;

    /// Rolls back any open transaction and discards tracked state. Idempotent.
    async fn dispose(&self);

    fn has_changes(&self) -> bool;

    async fn in_transaction(&self) -> bool;
}

/// [`UnitOfWork`] bound to a [`DbSession`].
#[derive(Clone)]
pub struct SessionUnitOfWork {
    session: DbSession,
}

impl SessionUnitOfWork {
    /// Creates a new instance of [`SessionUnitOfWork`]
    pub fn new(session: DbSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl UnitOfWork for SessionUnitOfWork {
    async fn save_changes(&self) -> Result<u64, DataError> {
        self.session.save_changes().await
    }

    async fn save_changes_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<u64, DataError> {
        self.session.save_changes_with_cancel(cancel).await
    }

    async fn begin_transaction(&self) -> Result<(), DataError> {
        self.session.begin_transaction().await
    }

    async fn commit(&self) -> Result<(), DataError> {
        self.session.commit().await
    }

    async fn rollback(&self) -> Result<(), DataError> {
        self.session.rollback().await
    }

    async fn dispose(&self) {
        self.session.dispose().await
    }

    fn has_changes(&self) -> bool {
        self.session.has_changes()
    }

    async fn in_transaction(&self) -> bool {
        self.session.in_transaction().await
    }
}
