// Copyright 2024 redikv Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Owns the live `Store` handle and the lock discipline around it: every
//! command except `FLUSHDB`/restore only ever needs to borrow the current
//! handle for the duration of one store call, so a `RwLock` held for the
//! length of a read is enough; `FLUSHDB` and `restore` replace the handle
//! outright and need the write side.

use std::cell::RefCell;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::RwLock;

use redikv_store::Store;
use redikv_store::WriteBatch;
use redikv_types::Error;

use crate::snapshot_codec;

pub struct StateMachine {
    store: RwLock<Option<Arc<dyn Store>>>,
    closed: AtomicBool,
}

impl StateMachine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store: RwLock::new(Some(store)),
            closed: AtomicBool::new(false),
        }
    }

    /// A clone of the current store handle. Callers that need several
    /// operations to observe the same store instance (e.g. a `DEL` over
    /// several keys) should call this once and reuse the handle, rather
    /// than calling it per key -- `FLUSHDB`/`restore` can swap the handle
    /// out between calls.
    pub fn store_handle(&self) -> Arc<dyn Store> {
        self.store
            .read()
            .expect("state machine lock poisoned")
            .as_ref()
            .expect("store handle missing")
            .clone()
    }

    /// Drops the current store and rebuilds an empty one in its place,
    /// holding the exclusive lock for the whole operation so no concurrent
    /// read can observe a torn-down-but-not-yet-rebuilt store.
    ///
    /// Takes the handle out of the lock cell before calling `recreate`, so
    /// this local variable is the store's only remaining owner -- `recreate`
    /// needs sole ownership to release the old engine's on-disk lock before
    /// the replacement opens at the same path.
    pub fn flushdb(&self) -> Result<(), Error> {
        let mut guard = self.store.write().expect("state machine lock poisoned");
        let current = guard.take().expect("store handle missing");
        *guard = Some(current.recreate()?);
        Ok(())
    }

    /// Encodes every family in key order through the snapshot wire format,
    /// reading through a read-consistent snapshot handle so the result does
    /// not observe writes made while it is being built.
    pub fn snapshot(&self) -> Result<Vec<u8>, Error> {
        let store = self.store_handle();
        let snap = store.snapshot()?;
        let mut iter = snap.new_iterator();
        iter.first();

        let mut entries = Vec::new();
        while iter.valid() {
            entries.push((
                iter.key().expect("valid iterator yields a key").to_vec(),
                iter.value().expect("valid iterator yields a value").to_vec(),
            ));
            iter.next();
        }

        let mut out = Vec::new();
        snapshot_codec::encode(&mut out, &entries)?;
        Ok(out)
    }

    /// Installs a received snapshot: replaces the store wholesale the same
    /// way `flushdb` does, then streams the decoded records into the fresh
    /// store in bounded-size batches.
    pub fn restore(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut guard = self.store.write().expect("state machine lock poisoned");
        let current = guard.take().expect("store handle missing");
        let fresh = current.recreate()?;

        let pending = RefCell::new(WriteBatch::new());
        snapshot_codec::decode(
            bytes,
            |k, v| {
                pending.borrow_mut().put(k, v);
                Ok(())
            },
            || {
                let mut batch = pending.borrow_mut();
                if batch.is_empty() {
                    return Ok(());
                }
                log::debug!("restore: flushing a batch of {} ops", batch.len());
                let taken = std::mem::take(&mut *batch);
                drop(batch);
                fresh.write(taken)
            },
        )?;

        let tail = pending.into_inner();
        if !tail.is_empty() {
            fresh.write(tail)?;
        }

        *guard = Some(fresh);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use redikv_sled_store::SledStore;
    use redikv_sled_store::SledStoreOptions;

    use super::*;

    fn make(dir: &std::path::Path) -> StateMachine {
        let opts = SledStoreOptions::new(dir.join("node.db"), false);
        let store = SledStore::open(opts).unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        StateMachine::new(store)
    }

    #[test]
    fn flushdb_replaces_the_handle() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make(dir.path());
        sm.store_handle().put(b"k1", b"v1").unwrap();
        assert_eq!(sm.store_handle().get(b"k1").unwrap(), Some(b"v1".to_vec()));
        sm.flushdb().unwrap();
        assert_eq!(sm.store_handle().get(b"k1").unwrap(), None);
    }

    #[test]
    fn flushdb_survives_a_large_number_of_keys() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make(dir.path());
        for i in 0..1000u32 {
            sm.store_handle()
                .put(format!("k{i}").as_bytes(), b"v")
                .unwrap();
        }
        sm.flushdb().unwrap();
        assert_eq!(sm.store_handle().get(b"k0").unwrap(), None);
        sm.store_handle().put(b"after", b"v").unwrap();
        assert_eq!(sm.store_handle().get(b"after").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn snapshot_then_restore_round_trips_into_a_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make(dir.path());
        sm.store_handle().put(b"a", b"1").unwrap();
        sm.store_handle().put(b"b", b"2").unwrap();

        let bytes = sm.snapshot().unwrap();
        sm.restore(&bytes).unwrap();

        assert_eq!(sm.store_handle().get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(sm.store_handle().get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn restore_wipes_whatever_was_there_before() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make(dir.path());
        sm.store_handle().put(b"stale", b"v").unwrap();

        let other_dir = tempfile::tempdir().unwrap();
        let other = make(other_dir.path());
        other.store_handle().put(b"fresh", b"v").unwrap();
        let bytes = other.snapshot().unwrap();

        sm.restore(&bytes).unwrap();
        assert_eq!(sm.store_handle().get(b"stale").unwrap(), None);
        assert_eq!(sm.store_handle().get(b"fresh").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn closed_flag_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make(dir.path());
        assert!(!sm.is_closed());
        sm.close();
        assert!(sm.is_closed());
    }
}
