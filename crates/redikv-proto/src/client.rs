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

//! A minimal client over this crate's wire format, over a plain TCP
//! connection. Its one real use is the TTL reaper, which issues
//! `LISTEX`/`DELIF` through the same client protocol rather than
//! in-process, so that expirations flow through the normal write path and
//! get replicated like everything else. Lazily (re)connects on first use
//! and on any I/O error, since the reaper runs for the lifetime of the
//! process and the local listener may restart underneath it.

use std::io;

use redikv_types::Error;
use redikv_types::Reply;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::wire;
use crate::wire::Decoded;

pub struct Client {
    addr: String,
    conn: Mutex<Option<TcpStream>>,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: Mutex::new(None),
        }
    }

    pub async fn call(&self, args: &[Vec<u8>]) -> Result<Reply, Error> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }

        match self.call_on(guard.as_mut().unwrap(), args).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                // The connection may have gone bad; drop it so the next
                // call reconnects instead of repeating the same error.
                *guard = None;
                Err(e)
            }
        }
    }

    async fn connect(&self) -> Result<TcpStream, Error> {
        TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Error::Store(format!("connect to {}: {e}", self.addr)))
    }

    async fn call_on(&self, stream: &mut TcpStream, args: &[Vec<u8>]) -> Result<Reply, Error> {
        let request = wire::encode_command(args);
        stream
            .write_all(&request)
            .await
            .map_err(io_err)?;

        let mut buf = Vec::with_capacity(256);
        loop {
            match wire::decode_reply(&buf) {
                Ok(Decoded::Complete { value, .. }) => return Ok(value),
                Ok(Decoded::Incomplete) => {}
                Err(e) => return Err(e),
            }

            let mut chunk = [0u8; 4096];
            let n = stream.read(&mut chunk).await.map_err(io_err)?;
            if n == 0 {
                return Err(Error::Store("connection closed before a full reply arrived".into()));
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}

fn io_err(e: io::Error) -> Error {
    Error::Store(e.to_string())
}
