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

//! The `Applier` this workspace actually ships: a single-node stand-in
//! that assigns apply indexes from an in-process counter and runs the
//! mutate/respond steps inline, with no replication and no log. A real
//! deployment would swap this for a consensus-backed implementation
//! without any command handler needing to change -- that engine is out of
//! scope here, same as the embedded ordered store.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use redikv_types::Error;
use redikv_types::Reply;

use crate::applier::Action;
use crate::applier::Applier;

pub struct LocalApplier {
    next_index: AtomicU64,
}

impl LocalApplier {
    pub fn new() -> Self {
        Self {
            next_index: AtomicU64::new(1),
        }
    }
}

impl Default for LocalApplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Applier for LocalApplier {
    async fn apply(&self, _command_name: &'static str, action: Action) -> Result<Reply, Error> {
        match action {
            Action::Read(read) => read(),
            Action::Write { mutate, respond } => {
                let index = self.next_index.fetch_add(1, Ordering::SeqCst);
                let outcome = mutate(index)?;
                respond(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applier::MutationOutcome;

    #[tokio::test]
    async fn assigns_increasing_indexes() {
        let applier = LocalApplier::new();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

        for _ in 0..3 {
            let seen = seen.clone();
            let mutate: crate::applier::MutateFn = Box::new(move |idx| {
                seen.lock().unwrap().push(idx);
                Ok(MutationOutcome::Unit)
            });
            let respond: crate::applier::RespondFn = Box::new(|_| Ok(Reply::ok()));
            applier
                .apply("SET", Action::Write { mutate, respond })
                .await
                .unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }
}
