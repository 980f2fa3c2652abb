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

//! The replicated key-value state machine. Everything here is agnostic to
//! how a command physically arrives (that's `redikv-proto`'s job) and to
//! how log entries actually get ordered across a cluster (that's a
//! consensus engine's job, out of scope for this workspace) -- this crate owns
//! the key encoding, the range scan, the command semantics, the snapshot
//! wire format, and the TTL reaper that ties expiration to the same write
//! path as every other mutation.

pub mod applier;
pub mod clock;
pub mod command;
pub mod glob;
pub mod handlers;
pub mod keycodec;
pub mod local_applier;
pub mod range;
pub mod reaper;
pub mod snapshot_codec;
pub mod state_machine;

pub use applier::Action;
pub use applier::Applier;
pub use applier::MutationOutcome;
pub use command::Command;
pub use local_applier::LocalApplier;
pub use range::Direction;
pub use reaper::ReaperTransport;
pub use reaper::TtlReaper;
pub use state_machine::StateMachine;
