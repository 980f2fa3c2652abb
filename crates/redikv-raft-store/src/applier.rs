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

//! The facade the state machine calls through for every command, so that a
//! real consensus engine can be dropped in later without touching a single
//! command handler. This workspace does not ship one: the engine that turns
//! a `Write` action into a durably-ordered log entry is explicitly out of
//! scope, same as the ordered store underneath `Store`.

use async_trait::async_trait;
use redikv_types::ApplyIndex;
use redikv_types::Error;
use redikv_types::Reply;

/// The outcome a write's mutate step hands to its respond step. Every
/// command in this system's write path produces one of these two shapes,
/// so there is no need for a type-erased payload.
pub enum MutationOutcome {
    Unit,
    Count(usize),
}

pub type MutateFn = Box<dyn FnOnce(ApplyIndex) -> Result<MutationOutcome, Error> + Send>;
pub type RespondFn = Box<dyn FnOnce(MutationOutcome) -> Result<Reply, Error> + Send>;
pub type ReadFn = Box<dyn FnOnce() -> Result<Reply, Error> + Send>;

/// What a command asks the applier to do: a pure read served locally, or a
/// write whose `mutate` step must run once per accepted log entry (on
/// every replica, in log order) before `respond` builds the client-facing
/// reply on the node that received the command.
pub enum Action {
    Read(ReadFn),
    Write { mutate: MutateFn, respond: RespondFn },
}

/// Callers describe what to do; the implementation decides how (and
/// whether) to route it through consensus.
#[async_trait]
pub trait Applier: Send + Sync {
    /// `command_name` is carried through for logging and leader-redirect
    /// messages; it is not interpreted.
    async fn apply(&self, command_name: &'static str, action: Action) -> Result<Reply, Error>;
}
