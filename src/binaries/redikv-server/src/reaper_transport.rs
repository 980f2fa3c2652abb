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

//! Wires the TTL reaper's `ReaperTransport` to a real RESP client dialing
//! this node's own listener. This is the one piece that has to live here
//! rather than in `redikv-raft-store` or `redikv-proto`: it needs both the
//! reaper's trait and the wire client, and neither of those crates depends
//! on the other -- the state-machine layer and the wire protocol layer stay
//! separable by design.

use async_trait::async_trait;
use redikv_proto::Client;
use redikv_raft_store::ReaperTransport;
use redikv_types::ApplyIndex;
use redikv_types::Error;
use redikv_types::Reply;

pub struct LoopbackReaperTransport {
    client: Client,
}

impl LoopbackReaperTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            client: Client::new(addr),
        }
    }
}

#[async_trait]
impl ReaperTransport for LoopbackReaperTransport {
    async fn listex(&self, limit: u64) -> Result<Vec<(Vec<u8>, ApplyIndex)>, Error> {
        let reply = self
            .client
            .call(&[b"LISTEX".to_vec(), limit.to_string().into_bytes()])
            .await?;
        reply_to_error(&reply)?;

        let Reply::Array(items) = reply else {
            return Err(Error::Corrupt("LISTEX reply was not an array".into()));
        };
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut it = items.into_iter();
        while let (Some(key), Some(index)) = (it.next(), it.next()) {
            let Reply::Bulk(key) = key else {
                return Err(Error::Corrupt("LISTEX key was not bulk".into()));
            };
            let Reply::Bulk(index) = index else {
                return Err(Error::Corrupt("LISTEX index was not bulk".into()));
            };
            let index: ApplyIndex = std::str::from_utf8(&index)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::Corrupt("LISTEX index was not a number".into()))?;
            pairs.push((key, index));
        }
        Ok(pairs)
    }

    async fn delif(&self, max_index: ApplyIndex, keys: &[Vec<u8>]) -> Result<(), Error> {
        let mut args = vec![b"DELIF".to_vec(), max_index.to_string().into_bytes()];
        args.extend(keys.iter().cloned());
        let reply = self.client.call(&args).await?;
        reply_to_error(&reply)
    }
}

fn reply_to_error(reply: &Reply) -> Result<(), Error> {
    if let Reply::Error(msg) = reply {
        return Err(Error::Redirect(msg.clone()));
    }
    Ok(())
}
