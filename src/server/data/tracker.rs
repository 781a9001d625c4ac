//! Identity map and staged writes for one persistence session.
//!
//! The tracker never touches the database itself. [`ChangeTracker::plan`] turns the staged
//! state into a list of writes which the session executes inside one transaction; each write
//! is accepted back into the tracker only after that transaction commits, so a failed save
//! leaves every entry exactly as it was.

use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
    ops::Range,
};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};

use crate::server::{
    data::{
        entity::{key_from_insert, table_name, DbEntity},
        tracked::Tracked,
    },
    error::data::DataError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// Staged for insert.
    Added,
    /// Attached from a query; written only if the value differs from its snapshot.
    Unchanged,
    /// Staged for a full overwrite of every column.
    Modified,
    /// Staged for removal.
    Deleted,
}

struct Entry<M> {
    /// Staging order; writes are executed in ascending order.
    seq: u64,
    state: EntryState,
    current: Tracked<M>,
    original: Option<M>,
}

impl<M: DbEntity> Entry<M> {
    fn new(seq: u64, state: EntryState, model: M) -> Self {
        let original = match state {
            EntryState::Unchanged | EntryState::Deleted => Some(model.clone()),
            EntryState::Added | EntryState::Modified => None,
        };

        Self {
            seq,
            state,
            current: Tracked::new(model),
            original,
        }
    }

    fn is_dirty(&self) -> bool {
        match self.state {
            EntryState::Unchanged => self.original.as_ref() != Some(&self.current.get()),
            _ => true,
        }
    }
}

/// Tracked entries of a single entity type.
pub(crate) struct EntitySet<M: DbEntity> {
    identity: HashMap<M::Key, Entry<M>>,
    /// Entries staged for insert whose key the database has not assigned yet.
    added: Vec<Entry<M>>,
}

impl<M: DbEntity> EntitySet<M> {
    fn new() -> Self {
        Self {
            identity: HashMap::new(),
            added: Vec::new(),
        }
    }

    /// Attaches a value read from the database, resolving it against the identity map.
    ///
    /// If the key is already tracked the existing instance wins and the freshly read value
    /// is discarded.
    pub fn attach(&mut self, seq: u64, model: M) -> Tracked<M> {
        self.identity
            .entry(model.key())
            .or_insert_with(|| Entry::new(seq, EntryState::Unchanged, model))
            .current
            .clone()
    }

    pub fn local(&self, key: &M::Key) -> Option<Tracked<M>> {
        self.identity.get(key).map(|entry| entry.current.clone())
    }

    pub fn state(&self, key: &M::Key) -> Option<EntryState> {
        self.identity.get(key).map(|entry| entry.state)
    }

    pub fn stage_insert(&mut self, seq: u64, model: M) -> Result<Tracked<M>, DataError> {
        if model.is_transient() {
            let entry = Entry::new(seq, EntryState::Added, model);
            let current = entry.current.clone();
            self.added.push(entry);

            return Ok(current);
        }

        let key = model.key();
        match self.identity.get_mut(&key) {
            // Inserting a key staged for removal replaces the row instead
            Some(entry) if entry.state == EntryState::Deleted => {
                entry.current.set(model);
                entry.state = EntryState::Modified;
                entry.seq = seq;

                Ok(entry.current.clone())
            }
            Some(_) => Err(DataError::IdentityConflict {
                entity: table_name::<M>(),
                key: format!("{:?}", key),
            }),
            None => {
                let entry = Entry::new(seq, EntryState::Added, model);
                let current = entry.current.clone();
                self.identity.insert(key, entry);

                Ok(current)
            }
        }
    }

    /// Stages a full overwrite, attaching the value if its key is not tracked yet.
    ///
    /// A transient value cannot be overwritten and is staged for insert instead.
    pub fn stage_update(&mut self, seq: u64, model: M) -> Result<Tracked<M>, DataError> {
        if model.is_transient() {
            return self.stage_insert(seq, model);
        }

        let key = model.key();
        match self.identity.get_mut(&key) {
            Some(entry) => {
                entry.current.set(model);
                if entry.state != EntryState::Added {
                    entry.state = EntryState::Modified;
                }
                entry.seq = seq;

                Ok(entry.current.clone())
            }
            None => {
                let entry = Entry::new(seq, EntryState::Modified, model);
                let current = entry.current.clone();
                self.identity.insert(key, entry);

                Ok(current)
            }
        }
    }

    pub fn stage_delete(&mut self, seq: u64, model: M) -> Result<(), DataError> {
        if model.is_transient() {
            // An insert that was never saved is simply forgotten, one instance per delete
            return match self.added.iter().position(|entry| entry.current.get() == model) {
                Some(index) => {
                    self.added.remove(index);
                    Ok(())
                }
                None => Err(keyless_delete::<M>()),
            };
        }

        let key = model.key();
        match self.state(&key) {
            Some(EntryState::Added) => {
                self.identity.remove(&key);
            }
            Some(_) => {
                if let Some(entry) = self.identity.get_mut(&key) {
                    entry.state = EntryState::Deleted;
                    entry.seq = seq;
                }
            }
            None => {
                self.identity
                    .insert(key, Entry::new(seq, EntryState::Deleted, model));
            }
        }

        Ok(())
    }

    /// Fails if any entity of the batch could not be staged for insert.
    pub fn check_insert(&self, models: &[M]) -> Result<(), DataError> {
        let mut batch = HashSet::new();

        for model in models.iter().filter(|model| !model.is_transient()) {
            let key = model.key();
            let free = matches!(self.state(&key), None | Some(EntryState::Deleted));

            if !free || !batch.insert(key.clone()) {
                return Err(DataError::IdentityConflict {
                    entity: table_name::<M>(),
                    key: format!("{:?}", key),
                });
            }
        }

        Ok(())
    }

    /// Fails if any entity of the batch could not be staged for removal.
    ///
    /// Each transient entity must match its own pending insert.
    pub fn check_delete(&self, models: &[M]) -> Result<(), DataError> {
        let mut claimed = vec![false; self.added.len()];

        for model in models.iter().filter(|model| model.is_transient()) {
            let slot = self
                .added
                .iter()
                .enumerate()
                .position(|(index, entry)| !claimed[index] && entry.current.get() == *model);

            match slot {
                Some(index) => claimed[index] = true,
                None => return Err(keyless_delete::<M>()),
            }
        }

        Ok(())
    }

    pub fn detach(&mut self, key: &M::Key) -> bool {
        self.identity.remove(key).is_some()
    }

    fn complete_insert(&mut self, seq: u64, handle: Tracked<M>, stored: M) {
        self.added.retain(|entry| entry.seq != seq);
        self.identity.retain(|_, entry| entry.seq != seq);

        handle.set(stored.clone());
        self.identity.insert(
            stored.key(),
            Entry {
                seq,
                state: EntryState::Unchanged,
                current: handle,
                original: Some(stored),
            },
        );
    }

    fn complete_update(&mut self, seq: u64, key: &M::Key, stored: M) {
        if let Some(entry) = self.identity.get_mut(key) {
            if entry.seq == seq {
                entry.state = EntryState::Unchanged;
                entry.original = Some(stored);
            }
        }
    }

    fn complete_delete(&mut self, seq: u64, key: &M::Key) {
        let restaged = self
            .identity
            .get(key)
            .is_some_and(|entry| entry.seq != seq || entry.state != EntryState::Deleted);
        if !restaged {
            self.identity.remove(key);
        }
    }
}

fn keyless_delete<M: DbEntity>() -> DataError {
    DataError::InvalidKey {
        entity: table_name::<M>(),
        reason: "cannot delete an entity without an assigned key".to_string(),
    }
}

/// Type-erased view of an [`EntitySet`] so one tracker can hold every entity type.
trait ErasedSet: Send {
    fn plan(&self) -> Vec<Box<dyn ErasedWrite>>;
    fn has_changes(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: DbEntity> ErasedSet for EntitySet<M> {
    fn plan(&self) -> Vec<Box<dyn ErasedWrite>> {
        let mut writes: Vec<Box<dyn ErasedWrite>> = Vec::new();

        for entry in &self.added {
            writes.push(Box::new(PendingWrite::<M> {
                seq: entry.seq,
                op: WriteOp::Insert,
                key: None,
                model: entry.current.get(),
                handle: entry.current.clone(),
                stored: None,
            }));
        }

        for (key, entry) in &self.identity {
            if !entry.is_dirty() {
                continue;
            }

            let op = match entry.state {
                EntryState::Added => WriteOp::Insert,
                EntryState::Unchanged | EntryState::Modified => WriteOp::Update,
                EntryState::Deleted => WriteOp::Delete,
            };

            writes.push(Box::new(PendingWrite::<M> {
                seq: entry.seq,
                op,
                key: Some(key.clone()),
                model: entry.current.get(),
                handle: entry.current.clone(),
                stored: None,
            }));
        }

        writes
    }

    fn has_changes(&self) -> bool {
        !self.added.is_empty() || self.identity.values().any(Entry::is_dirty)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One staged insert, update or delete, captured when the save began.
#[async_trait]
pub(crate) trait ErasedWrite: Send {
    fn seq(&self) -> u64;

    /// Executes the write inside the save's transaction, returning the affected rows.
    async fn execute(&mut self, txn: &DatabaseTransaction) -> Result<u64, DataError>;

    /// Records the committed write in the tracker.
    fn accept(self: Box<Self>, tracker: &mut ChangeTracker) -> Result<(), DataError>;
}

#[derive(Clone, Copy, Debug)]
enum WriteOp {
    Insert,
    Update,
    Delete,
}

struct PendingWrite<M: DbEntity> {
    seq: u64,
    op: WriteOp,
    /// Identity map key; `None` for inserts the database assigns a key to.
    key: Option<M::Key>,
    model: M,
    handle: Tracked<M>,
    stored: Option<M>,
}

impl<M: DbEntity> PendingWrite<M> {
    fn target_key(&self) -> M::Key {
        self.key.clone().unwrap_or_else(|| self.model.key())
    }

    fn conflict(&self) -> DataError {
        DataError::ConcurrentModification {
            entity: table_name::<M>(),
            key: format!("{:?}", self.target_key()),
        }
    }
}

#[async_trait]
impl<M: DbEntity> ErasedWrite for PendingWrite<M> {
    fn seq(&self) -> u64 {
        self.seq
    }

    async fn execute(&mut self, txn: &DatabaseTransaction) -> Result<u64, DataError> {
        match self.op {
            WriteOp::Insert => {
                let transient = self.model.is_transient();
                let mut active = self.model.clone().into_active().reset_all();
                if transient {
                    active.not_set(M::key_column());
                }

                let result = M::Table::insert(active)
                    .exec(txn)
                    .await
                    .map_err(DataError::Persistence)?;

                let key = if transient {
                    key_from_insert::<M>(result.last_insert_id)?
                } else {
                    self.model.key()
                };

                let stored = M::Table::find()
                    .filter(ColumnTrait::eq(&M::key_column(), key.clone()))
                    .one(txn)
                    .await
                    .map_err(DataError::Persistence)?
                    .ok_or_else(|| {
                        DataError::Internal(format!(
                            "row inserted into {} with key {:?} could not be read back",
                            table_name::<M>(),
                            key
                        ))
                    })?;

                self.stored = Some(stored);

                Ok(1)
            }
            WriteOp::Update => {
                let mut active = self.model.clone().into_active().reset_all();
                active.not_set(M::key_column());

                let result = M::Table::update_many()
                    .set(active)
                    .filter(ColumnTrait::eq(&M::key_column(), self.target_key()))
                    .exec(txn)
                    .await
                    .map_err(DataError::Persistence)?;

                if result.rows_affected == 0 {
                    return Err(self.conflict());
                }

                self.stored = Some(self.model.clone());

                Ok(result.rows_affected)
            }
            WriteOp::Delete => {
                let result = M::Table::delete_many()
                    .filter(ColumnTrait::eq(&M::key_column(), self.target_key()))
                    .exec(txn)
                    .await
                    .map_err(DataError::Persistence)?;

                if result.rows_affected == 0 {
                    return Err(self.conflict());
                }

                Ok(result.rows_affected)
            }
        }
    }

    fn accept(self: Box<Self>, tracker: &mut ChangeTracker) -> Result<(), DataError> {
        let write = *self;
        let set = tracker.set_mut::<M>()?;

        match write.op {
            WriteOp::Insert => {
                let stored = write.stored.ok_or_else(|| {
                    DataError::Internal("insert accepted before it was executed".to_string())
                })?;
                set.complete_insert(write.seq, write.handle, stored);
            }
            WriteOp::Update => {
                let key = write.key.clone().unwrap_or_else(|| write.model.key());
                let stored = write.stored.ok_or_else(|| {
                    DataError::Internal("update accepted before it was executed".to_string())
                })?;
                set.complete_update(write.seq, &key, stored);
            }
            WriteOp::Delete => {
                let key = write.key.clone().unwrap_or_else(|| write.model.key());
                set.complete_delete(write.seq, &key);
            }
        }

        Ok(())
    }
}

/// Change tracker of a persistence session: one [`EntitySet`] per entity type.
#[derive(Default)]
pub(crate) struct ChangeTracker {
    sets: HashMap<TypeId, Box<dyn ErasedSet>>,
    seq: u64,
}

impl ChangeTracker {
    /// Next staging sequence number.
    pub fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Reserves `count` consecutive staging sequence numbers.
    pub fn next_seqs(&mut self, count: usize) -> Range<u64> {
        let start = self.seq + 1;
        self.seq += count as u64;
        start..self.seq + 1
    }

    pub fn set<M: DbEntity>(&self) -> Option<&EntitySet<M>> {
        self.sets
            .get(&TypeId::of::<M>())
            .and_then(|set| set.as_any().downcast_ref::<EntitySet<M>>())
    }

    pub fn set_mut<M: DbEntity>(&mut self) -> Result<&mut EntitySet<M>, DataError> {
        self.sets
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Box::new(EntitySet::<M>::new()))
            .as_any_mut()
            .downcast_mut::<EntitySet<M>>()
            .ok_or_else(|| {
                DataError::Internal(format!(
                    "change tracker holds a mismatched set for {}",
                    table_name::<M>()
                ))
            })
    }

    /// Every pending write across all entity types, in staging order.
    pub fn plan(&self) -> Vec<Box<dyn ErasedWrite>> {
        let mut writes: Vec<Box<dyn ErasedWrite>> =
            self.sets.values().flat_map(|set| set.plan()).collect();
        writes.sort_by_key(|write| write.seq());
        writes
    }

    pub fn has_changes(&self) -> bool {
        self.sets.values().any(|set| set.has_changes())
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }
}

#[cfg(test)]
mod tests {
    use groundwork_test_utils::prelude::*;

    use super::*;

    type Role = entity::app_role::Model;

    fn role(id: i32, name: &str) -> Role {
        Role {
            id,
            name: name.to_string(),
        }
    }

    /// Expect attaching the same key twice to hand back the instance attached first
    #[test]
    fn attach_resolves_identity() {
        let mut tracker = ChangeTracker::default();
        let seq = tracker.next_seq();
        let set = tracker.set_mut::<Role>().unwrap();

        let first = set.attach(seq, role(1, "admin"));
        let second = set.attach(seq, role(1, "stale"));

        assert!(first.ptr_eq(&second));
        assert_eq!(second.get().name, "admin");
    }

    /// Expect an attached entity to produce no write until it is mutated through its handle
    #[test]
    fn detects_mutation_through_handle() {
        let mut tracker = ChangeTracker::default();
        let seq = tracker.next_seq();
        let handle = tracker.set_mut::<Role>().unwrap().attach(seq, role(1, "admin"));

        assert!(!tracker.has_changes());
        assert!(tracker.plan().is_empty());

        handle.modify(|r| r.name = "owner".to_string());

        assert!(tracker.has_changes());
        assert_eq!(tracker.plan().len(), 1);
    }

    /// Expect IdentityConflict when inserting an assigned key that is already tracked
    #[test]
    fn rejects_duplicate_assigned_key() {
        let mut tracker = ChangeTracker::default();
        let seq = tracker.next_seq();
        let set = tracker.set_mut::<Role>().unwrap();
        set.attach(seq, role(1, "admin"));

        let result = set.stage_insert(seq + 1, role(1, "other"));

        assert!(matches!(result, Err(DataError::IdentityConflict { .. })));
    }

    /// Expect any number of transient inserts to be staged side by side
    #[test]
    fn stages_transient_inserts() {
        let mut tracker = ChangeTracker::default();
        for name in ["a", "b", "c"] {
            let seq = tracker.next_seq();
            tracker
                .set_mut::<Role>()
                .unwrap()
                .stage_insert(seq, factory::mock_role_model(name))
                .unwrap();
        }

        assert_eq!(tracker.plan().len(), 3);
    }

    /// Expect deleting an entity staged for insert to cancel the insert entirely
    #[test]
    fn delete_cancels_pending_insert() {
        let mut tracker = ChangeTracker::default();
        let seq = tracker.next_seq();
        let set = tracker.set_mut::<Role>().unwrap();
        set.stage_insert(seq, role(5, "admin")).unwrap();
        set.stage_delete(seq + 1, role(5, "admin")).unwrap();

        assert!(set.state(&5).is_none());
        assert!(!tracker.has_changes());
    }

    /// Expect deleting one of two equal pending inserts to cancel only that one
    #[test]
    fn delete_cancels_one_of_equal_inserts() {
        let mut tracker = ChangeTracker::default();
        let seqs = tracker.next_seqs(3);
        let set = tracker.set_mut::<Role>().unwrap();
        let mut seqs = seqs.into_iter();
        set.stage_insert(seqs.next().unwrap(), factory::mock_role_model("admin"))
            .unwrap();
        set.stage_insert(seqs.next().unwrap(), factory::mock_role_model("admin"))
            .unwrap();

        set.stage_delete(seqs.next().unwrap(), factory::mock_role_model("admin"))
            .unwrap();

        assert_eq!(tracker.plan().len(), 1);
    }

    /// Expect an insert batch to be rejected when it repeats a key or reuses a tracked one
    #[test]
    fn check_insert_rejects_conflicting_batch() {
        let mut tracker = ChangeTracker::default();
        let set = tracker.set_mut::<Role>().unwrap();
        set.attach(1, role(1, "admin"));

        let tracked = set.check_insert(&[factory::mock_role_model("new"), role(1, "copy")]);
        let repeated = set.check_insert(&[role(2, "a"), role(2, "b")]);
        let valid = set.check_insert(&[
            factory::mock_role_model("new"),
            factory::mock_role_model("new"),
            role(2, "a"),
        ]);

        assert!(matches!(tracked, Err(DataError::IdentityConflict { .. })));
        assert!(matches!(repeated, Err(DataError::IdentityConflict { .. })));
        assert!(valid.is_ok());
    }

    /// Expect a delete batch to need one pending insert per transient entity
    #[test]
    fn check_delete_matches_each_pending_insert_once() {
        let mut tracker = ChangeTracker::default();
        let set = tracker.set_mut::<Role>().unwrap();
        set.stage_insert(1, factory::mock_role_model("admin"))
            .unwrap();

        let once = set.check_delete(&[factory::mock_role_model("admin"), role(4, "kept")]);
        let twice = set.check_delete(&[
            factory::mock_role_model("admin"),
            factory::mock_role_model("admin"),
        ]);

        assert!(once.is_ok());
        assert!(matches!(twice, Err(DataError::InvalidKey { .. })));
    }

    /// Expect reserved sequence numbers to continue after the last one handed out
    #[test]
    fn reserves_consecutive_sequence_numbers() {
        let mut tracker = ChangeTracker::default();
        let first = tracker.next_seq();

        let reserved = tracker.next_seqs(3);

        assert_eq!(reserved, first + 1..first + 4);
        assert_eq!(tracker.next_seq(), first + 4);
    }

    /// Expect InvalidKey when deleting a transient entity that was never staged
    #[test]
    fn delete_of_transient_entity_fails() {
        let mut tracker = ChangeTracker::default();
        let set = tracker.set_mut::<Role>().unwrap();

        let result = set.stage_delete(1, factory::mock_role_model("admin"));

        assert!(matches!(result, Err(DataError::InvalidKey { .. })));
    }

    /// Expect updating an untracked entity to attach it as Modified
    #[test]
    fn update_attaches_untracked_entity() {
        let mut tracker = ChangeTracker::default();
        let set = tracker.set_mut::<Role>().unwrap();

        set.stage_update(1, role(3, "editor")).unwrap();

        assert_eq!(set.state(&3), Some(EntryState::Modified));
    }

    /// Expect writes to be planned in the order they were staged across entity types
    #[test]
    fn plans_writes_in_staging_order() {
        let mut tracker = ChangeTracker::default();
        let first = tracker.next_seq();
        tracker
            .set_mut::<Role>()
            .unwrap()
            .stage_delete(first, role(2, "old"))
            .unwrap();
        let second = tracker.next_seq();
        tracker
            .set_mut::<entity::app_user::Model>()
            .unwrap()
            .stage_insert(second, factory::mock_user_model("alice"))
            .unwrap();

        let seqs: Vec<u64> = tracker.plan().iter().map(|w| w.seq()).collect();

        assert_eq!(seqs, vec![first, second]);
    }
}
