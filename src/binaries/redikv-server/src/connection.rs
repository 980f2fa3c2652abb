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

//! One task per accepted connection: decode a command, dispatch it, write
//! back a reply, repeat until the client disconnects or sends `SHUTDOWN`.

use std::sync::Arc;

use redikv_proto::Decoded;
use redikv_raft_store::command;
use redikv_raft_store::handlers;
use redikv_raft_store::Applier;
use redikv_raft_store::StateMachine;
use redikv_types::Reply;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;

pub async fn handle(
    mut stream: TcpStream,
    sm: Arc<StateMachine>,
    applier: Arc<dyn Applier>,
    shutdown: Arc<Notify>,
) {
    let mut buf = Vec::with_capacity(4096);

    loop {
        let args = match read_command(&mut stream, &mut buf).await {
            Ok(Some(args)) => args,
            Ok(None) => return,
            Err(e) => {
                log::warn!("connection error: {e}");
                return;
            }
        };

        let command = match command::parse(&args) {
            Ok(command) => command,
            Err(e) => {
                if write_reply(&mut stream, &Reply::from(e)).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let is_shutdown = matches!(command, command::Command::Shutdown);

        let reply = match handlers::dispatch(&sm, applier.as_ref(), command).await {
            Ok(reply) => reply,
            Err(e) => Reply::from(e),
        };

        if write_reply(&mut stream, &reply).await.is_err() {
            return;
        }

        if is_shutdown {
            log::info!("SHUTDOWN received, closing listener");
            sm.close();
            shutdown.notify_waiters();
            return;
        }
    }
}

async fn read_command(
    stream: &mut TcpStream,
    buf: &mut Vec<u8>,
) -> Result<Option<Vec<Vec<u8>>>, redikv_types::Error> {
    loop {
        match redikv_proto::decode_command(buf)? {
            Decoded::Complete { value, consumed } => {
                buf.drain(..consumed);
                return Ok(Some(value));
            }
            Decoded::Incomplete => {}
        }

        let mut chunk = [0u8; 4096];
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| redikv_types::Error::Store(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn write_reply(stream: &mut TcpStream, reply: &Reply) -> std::io::Result<()> {
    let mut out = Vec::new();
    redikv_proto::encode_reply(reply, &mut out);
    stream.write_all(&out).await
}
