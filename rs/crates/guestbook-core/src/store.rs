//! The shared entry table.
//!
//! One table is created at process start and handed by reference to every
//! session and embedded component. Contents are volatile: nothing survives a
//! restart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entry::GuestEntry;

/// Storage seam the views depend on.
///
/// Each call is atomic with respect to every other call. Nothing spans a
/// read-then-write; display caps are applied by the reader.
pub trait EntryStore: Send + Sync {
    /// Idempotent; allocates the backing table on first call.
    fn ensure_exists(&self);

    /// Add or overwrite the entry at its id. No validation.
    fn insert(&self, entry: GuestEntry);

    /// Entries ordered by id descending, at most `limit` of them.
    fn list_recent(&self, limit: usize) -> Vec<GuestEntry>;

    /// Remove every entry. No-op when the table was never created.
    fn clear(&self);

    /// A value never returned before by this store.
    fn next_id(&self) -> u64;
}

/// In-memory ordered table keyed by entry id.
#[derive(Debug)]
pub struct GuestTable {
    // `None` until first use
    rows: RwLock<Option<BTreeMap<u64, GuestEntry>>>,
    next_id: AtomicU64,
}

impl GuestTable {
    pub fn new() -> Self {
        Self::with_first_id(1)
    }

    /// Start id allocation at `first` instead of 1.
    pub fn with_first_id(first: u64) -> Self {
        GuestTable {
            rows: RwLock::new(None),
            next_id: AtomicU64::new(first),
        }
    }

    pub fn exists(&self) -> bool {
        self.read().is_some()
    }

    pub fn len(&self) -> usize {
        self.read().as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The table holds plain data; a panic mid-call cannot leave it half-updated,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Option<BTreeMap<u64, GuestEntry>>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<BTreeMap<u64, GuestEntry>>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for GuestTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore for GuestTable {
    fn ensure_exists(&self) {
        if self.exists() {
            return;
        }
        let mut rows = self.write();
        if rows.is_none() {
            tracing::debug!("creating guest entry table");
            *rows = Some(BTreeMap::new());
        }
    }

    fn insert(&self, entry: GuestEntry) {
        let mut rows = self.write();
        rows.get_or_insert_with(BTreeMap::new).insert(entry.id, entry);
    }

    fn list_recent(&self, limit: usize) -> Vec<GuestEntry> {
        match self.read().as_ref() {
            Some(rows) => rows.values().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn clear(&self) {
        if let Some(rows) = self.write().as_mut() {
            rows.clear();
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
