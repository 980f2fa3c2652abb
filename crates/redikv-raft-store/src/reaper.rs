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

//! Background TTL reaper. It does not call into the state machine directly:
//! it issues `LISTEX`/`DELIF` as real client commands
//! through whatever `ReaperTransport` the caller wires up, the same way
//! any other client would, so the deletions go through the ordinary write
//! path and get replicated like anything else.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redikv_types::ApplyIndex;
use redikv_types::Error;

use crate::state_machine::StateMachine;

const SLOW_TICK: Duration = Duration::from_millis(250);
const FAST_TICK: Duration = Duration::from_millis(1);
const LISTEX_LIMIT: u64 = 1000;

#[async_trait]
pub trait ReaperTransport: Send + Sync {
    async fn listex(&self, limit: u64) -> Result<Vec<(Vec<u8>, ApplyIndex)>, Error>;
    async fn delif(&self, max_index: ApplyIndex, keys: &[Vec<u8>]) -> Result<(), Error>;
}

pub struct TtlReaper<T: ReaperTransport> {
    sm: Arc<StateMachine>,
    transport: T,
}

impl<T: ReaperTransport> TtlReaper<T> {
    pub fn new(sm: Arc<StateMachine>, transport: T) -> Self {
        Self { sm, transport }
    }

    /// Runs until the state machine is marked closed. Meant to be spawned
    /// as its own task; never returns an error -- transient failures are
    /// logged and absorbed by the next tick's `LISTEX`.
    pub async fn run(mut self) {
        loop {
            if self.sm.is_closed() {
                return;
            }

            let fast = self.tick().await;
            tokio::time::sleep(if fast { FAST_TICK } else { SLOW_TICK }).await;
        }
    }

    /// Returns `true` if the reaper should tick again immediately (it saw a
    /// full batch and more expired keys likely remain).
    async fn tick(&mut self) -> bool {
        let expired = match self.transport.listex(LISTEX_LIMIT).await {
            Ok(pairs) => pairs,
            Err(e) => {
                if !e.is_leader_redirect() {
                    log::warn!("ttl reaper: LISTEX failed: {e}");
                }
                return false;
            }
        };

        if expired.is_empty() {
            return false;
        }

        let max_index = expired.iter().map(|(_, idx)| *idx).max().unwrap_or(0);
        let keys: Vec<Vec<u8>> = expired.iter().map(|(k, _)| k.clone()).collect();
        let is_full_batch = expired.len() as u64 == LISTEX_LIMIT;

        if let Err(e) = self.transport.delif(max_index, &keys).await {
            if !e.is_leader_redirect() {
                log::warn!("ttl reaper: DELIF failed: {e}");
            }
            return false;
        }

        is_full_batch
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use redikv_sled_store::SledStore;
    use redikv_sled_store::SledStoreOptions;
    use redikv_store::Store;

    use super::*;

    struct RecordingTransport {
        batches: Mutex<Vec<(ApplyIndex, Vec<Vec<u8>>)>>,
        to_return: Mutex<Vec<(Vec<u8>, ApplyIndex)>>,
    }

    #[async_trait]
    impl ReaperTransport for RecordingTransport {
        async fn listex(&self, _limit: u64) -> Result<Vec<(Vec<u8>, ApplyIndex)>, Error> {
            Ok(std::mem::take(&mut self.to_return.lock().unwrap()))
        }

        async fn delif(&self, max_index: ApplyIndex, keys: &[Vec<u8>]) -> Result<(), Error> {
            self.batches
                .lock()
                .unwrap()
                .push((max_index, keys.to_vec()));
            Ok(())
        }
    }

    fn make_sm(dir: &std::path::Path) -> Arc<StateMachine> {
        let opts = SledStoreOptions::new(dir.join("node.db"), false);
        let store = SledStore::open(opts).unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        Arc::new(StateMachine::new(store))
    }

    #[tokio::test]
    async fn tick_issues_delif_for_listed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make_sm(dir.path());
        let transport = RecordingTransport {
            batches: Mutex::new(vec![]),
            to_return: Mutex::new(vec![(b"a".to_vec(), 3), (b"b".to_vec(), 5)]),
        };
        let mut reaper = TtlReaper::new(sm, transport);
        let fast = reaper.tick().await;
        assert!(!fast);

        let batches = reaper.transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, 5);
        assert_eq!(batches[0].1, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[tokio::test]
    async fn tick_is_a_noop_when_nothing_expired() {
        let dir = tempfile::tempdir().unwrap();
        let sm = make_sm(dir.path());
        let transport = RecordingTransport {
            batches: Mutex::new(vec![]),
            to_return: Mutex::new(vec![]),
        };
        let mut reaper = TtlReaper::new(sm, transport);
        assert!(!reaper.tick().await);
        assert!(reaper.transport.batches.lock().unwrap().is_empty());
    }
}
