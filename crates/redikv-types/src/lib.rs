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

//! Shared domain types for redikv: the apply-index newtype, the expiration
//! key used by the secondary index, the error hierarchy, and the protocol-
//! agnostic reply value produced by command handlers.

mod error;
mod expire;
mod reply;

pub use error::Error;
pub use expire::ExpireKey;
pub use reply::Reply;

/// The monotonically nondecreasing index the consensus layer assigns to
/// every accepted log entry. Handlers receive it as a parameter; it is
/// never synthesized locally -- it is a property of the replicated entry.
pub type ApplyIndex = u64;

/// Nanoseconds since the Unix epoch, used for expiration instants.
pub type TimestampNanos = u64;
