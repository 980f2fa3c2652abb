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

//! A `sled`-backed `Store`. This is the one concrete "embedded ordered
//! key-value engine" this workspace ships; the engine itself is treated as
//! an external collaborator, so this adapter is intentionally thin -- its
//! only job is to satisfy `redikv_store::Store` faithfully.

mod cursor;
mod snapshot;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use redikv_store::Snapshot;
use redikv_store::Store;
use redikv_store::StoreIterator;
use redikv_store::WriteBatch;
use redikv_store::WriteOp;
use redikv_types::Error;

pub use cursor::SledCursor;
pub use snapshot::SledSnapshot;

/// Options controlling how a `SledStore` is opened: the data directory and
/// whether to flush synchronously.
#[derive(Debug, Clone)]
pub struct SledStoreOptions {
    pub dir: PathBuf,
    pub sync: bool,
}

impl SledStoreOptions {
    pub fn new(dir: impl Into<PathBuf>, sync: bool) -> Self {
        Self {
            dir: dir.into(),
            sync,
        }
    }
}

/// The single ordered store backing the `'k'`/`'e'`/`'x'` key families.
/// Everything lives in one `sled::Tree` -- the family tag byte is what
/// keeps the three regions disjoint and ordered.
#[derive(Debug)]
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    opts: SledStoreOptions,
}

const DATA_TREE: &str = "node";

impl SledStore {
    pub fn open(opts: SledStoreOptions) -> Result<Self, Error> {
        let db = sled::open(&opts.dir)?;
        let tree = db.open_tree(DATA_TREE)?;
        Ok(Self { db, tree, opts })
    }

    /// Directory the underlying engine persists to.
    pub fn path(&self) -> &Path {
        &self.opts.dir
    }

    /// Close and delete the on-disk files, then reopen empty with the same
    /// options. Used exclusively by `FLUSHDB`, which holds the state
    /// machine's exclusive lifecycle lock across this entire call.
    pub fn recreate(self) -> Result<Self, Error> {
        let opts = self.opts.clone();
        drop(self.tree);
        self.db.flush()?;
        drop(self.db);
        std::fs::remove_dir_all(&opts.dir).map_err(|e| Error::Store(e.to_string()))?;
        Self::open(opts)
    }

    fn flush_if_sync(&self) -> Result<(), Error> {
        if self.opts.sync {
            self.tree.flush()?;
        }
        Ok(())
    }
}

impl Store for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.tree.get(key)?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.tree.insert(key, value)?;
        self.flush_if_sync()
    }

    fn delete(&self, key: &[u8]) -> Result<(), Error> {
        self.tree.remove(key)?;
        self.flush_if_sync()
    }

    fn has(&self, key: &[u8]) -> Result<bool, Error> {
        Ok(self.tree.contains_key(key)?)
    }

    fn write(&self, batch: WriteBatch) -> Result<(), Error> {
        let mut sled_batch = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                WriteOp::Put(k, v) => sled_batch.insert(k, v),
                WriteOp::Delete(k) => sled_batch.remove(k),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        self.flush_if_sync()
    }

    fn new_iterator(&self) -> Box<dyn StoreIterator + '_> {
        Box::new(SledCursor::new(self.tree.clone()))
    }

    fn snapshot(&self) -> Result<Box<dyn Snapshot + '_>, Error> {
        Ok(Box::new(SledSnapshot::capture(&self.tree)?))
    }

    fn recreate(self: Arc<Self>) -> Result<Arc<dyn Store>, Error> {
        let owned = Arc::try_unwrap(self).map_err(|_| {
            Error::Store("cannot recreate: other handles to this store are still alive".into())
        })?;
        Ok(Arc::new(owned.recreate()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, SledStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(SledStoreOptions::new(dir.path().join("node.db"), false))
            .unwrap();
        (dir, store)
    }

    #[test]
    fn put_get_delete_roundtrip() {
        let (_dir, store) = open_temp();
        assert_eq!(store.get(b"k1").unwrap(), None);
        store.put(b"k1", b"v1").unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert!(store.has(b"k1").unwrap());
        store.delete(b"k1").unwrap();
        assert_eq!(store.get(b"k1").unwrap(), None);
        assert!(!store.has(b"k1").unwrap());
    }

    #[test]
    fn batch_write_is_atomic_looking() {
        let (_dir, store) = open_temp();
        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"b".to_vec(), b"2".to_vec());
        store.write(batch).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn recreate_empties_store() {
        let (_dir, store) = open_temp();
        store.put(b"a", b"1").unwrap();
        let store = store.recreate().unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
    }
}
