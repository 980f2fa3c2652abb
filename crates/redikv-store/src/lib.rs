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

//! The abstract ordered byte-key store the core depends on.
//!
//! The embedded engine itself (B-tree/LSM, prefix iteration, batched atomic
//! writes, snapshot handles) is out of scope for this workspace's core --
//! `redikv-raft-store` only ever talks to `dyn Store`. `redikv-sled-store`
//! supplies the one concrete adapter this repository ships.

mod batch;

use std::sync::Arc;

pub use batch::WriteBatch;
pub use batch::WriteOp;
use redikv_types::Error;

/// Thin interface over an ordered engine: get/put/delete/has, a batched
/// atomic write, a prefix-capable bidirectional iterator, and a
/// read-consistent snapshot handle.
///
/// Implementations must be safe to share across the connection-per-task
/// model (`Send + Sync`); the state machine is the sole owner of a `dyn
/// Store` handle and only swaps it wholesale on `FLUSHDB`.
pub trait Store: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), Error>;

    fn delete(&self, key: &[u8]) -> Result<(), Error>;

    fn has(&self, key: &[u8]) -> Result<bool, Error>;

    /// Apply every operation in `batch` atomically.
    fn write(&self, batch: WriteBatch) -> Result<(), Error>;

    /// A fresh iterator over the live (non-snapshotted) data.
    fn new_iterator(&self) -> Box<dyn StoreIterator + '_>;

    /// A read-consistent view that will not observe writes made after it
    /// was taken. Must be released (dropped) before an exclusive lifecycle
    /// lock (e.g. for `FLUSHDB`) is granted.
    fn snapshot(&self) -> Result<Box<dyn Snapshot + '_>, Error>;

    /// Tear down this handle's on-disk state and rebuild an empty store
    /// with the same identity/options, returning the replacement. Requires
    /// sole ownership of the handle (every other `Arc` clone must already be
    /// dropped) so the old engine's exclusive lock is released before the
    /// new one opens at the same path.
    fn recreate(self: Arc<Self>) -> Result<Arc<dyn Store>, Error>;
}

/// A read-consistent view of the store at a point in time.
pub trait Snapshot: Send {
    fn new_iterator(&self) -> Box<dyn StoreIterator + '_>;
}

/// A bidirectional cursor over the ordered key space.
///
/// Mirrors the LevelDB/sled-family iterator shape: callers must check
/// `valid()` after every positioning call before reading `key()`/`value()`.
pub trait StoreIterator {
    fn seek(&mut self, key: &[u8]);
    fn first(&mut self);
    fn last(&mut self);
    fn next(&mut self);
    fn prev(&mut self);
    fn valid(&self) -> bool;
    fn key(&self) -> Option<&[u8]>;
    fn value(&self) -> Option<&[u8]>;
    /// Explicit release. A correct implementation also releases resources
    /// on `Drop`; callers that want to free them eagerly (e.g. before
    /// taking an exclusive lock) should call this.
    fn release(&mut self) {}
    /// Any error encountered while iterating (I/O failure, decode error).
    fn error(&self) -> Option<Error> {
        None
    }
}
