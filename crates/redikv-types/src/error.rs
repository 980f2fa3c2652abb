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

/// The error hierarchy shared by the store adapter, the state machine, and
/// the wire protocol layer.
///
/// `Syntax`/`WrongArity`/`UnknownCommand` are client-facing and never affect
/// state; `Store` wraps I/O failures from the embedded engine; `Corrupt`
/// signals an invariant violation and is meant to be fatal -- callers should
/// let it unwind rather than recover from a damaged exkey record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR wrong number of arguments")]
    WrongArity,

    #[error("ERR unknown command")]
    UnknownCommand,

    /// Injected by the consensus layer: `ERR leader not known` or
    /// `TRY host:port`. The core never generates these itself; it only
    /// recognizes them (the reaper swallows them and backs off).
    #[error("{0}")]
    Redirect(String),

    #[error("store error: {0}")]
    Store(String),

    /// A stored record violates an invariant the core relies on (wrong
    /// exkey length, unknown family tag). Fatal: the process should abort
    /// rather than continue with corrupted state.
    #[error("invariant violation: {0}")]
    Corrupt(String),
}

impl Error {
    /// True for the two leadership-redirect shapes the reaper is told to
    /// swallow silently rather than log as a failure.
    pub fn is_leader_redirect(&self) -> bool {
        match self {
            Error::Redirect(msg) => msg == "ERR leader not known" || msg.starts_with("TRY "),
            _ => false,
        }
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Store(e.to_string())
    }
}

/// A convenience alias for this crate's `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
