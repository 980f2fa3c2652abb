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

use crate::Error;

/// A protocol-agnostic reply value. Command handlers only ever construct
/// `Reply`; the wire framer (`redikv-proto`) is the sole place that knows
/// how to serialize one of these into RESP bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK\r\n`-style simple string.
    Simple(String),
    /// `$len\r\n...\r\n` bulk string.
    Bulk(Vec<u8>),
    /// `$-1\r\n` null bulk.
    NullBulk,
    /// `:N\r\n` integer.
    Integer(i64),
    /// `*N\r\n...` array of replies.
    Array(Vec<Reply>),
    /// `-ERR ...\r\n` error line.
    Error(String),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn bulk(bytes: impl Into<Vec<u8>>) -> Self {
        Reply::Bulk(bytes.into())
    }

    pub fn array_of_bulks<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        Reply::Array(items.into_iter().map(|t| Reply::bulk(t)).collect())
    }
}

impl From<&Error> for Reply {
    fn from(e: &Error) -> Self {
        Reply::Error(e.to_string())
    }
}

impl From<Error> for Reply {
    fn from(e: Error) -> Self {
        Reply::Error(e.to_string())
    }
}
