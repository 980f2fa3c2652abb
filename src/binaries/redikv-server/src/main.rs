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

mod config;
mod connection;
mod reaper_transport;

use std::sync::Arc;

use clap::Parser;
use config::Config;
use config::Consistency;
use reaper_transport::LoopbackReaperTransport;
use redikv_raft_store::Applier;
use redikv_raft_store::LocalApplier;
use redikv_raft_store::StateMachine;
use redikv_raft_store::TtlReaper;
use redikv_sled_store::SledStore;
use redikv_sled_store::SledStoreOptions;
use redikv_store::Store;
use tokio::net::TcpListener;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level);

    if let Some(join) = &config.join {
        log::info!("--join={join} accepted and logged; no consensus engine is wired up to act on it");
    }
    if config.consistency != Consistency::Low {
        log::warn!(
            "--consistency={:?} requested, but this build only ever reads locally",
            config.consistency
        );
    }

    let node_dir = config.data.join("node.db");
    let opts = SledStoreOptions::new(node_dir, config.durability.is_sync());
    let store = SledStore::open(opts).map_err(to_io_error)?;
    let store: Arc<dyn Store> = Arc::new(store);

    let sm = Arc::new(StateMachine::new(store));
    let applier: Arc<dyn Applier> = Arc::new(LocalApplier::new());
    let shutdown = Arc::new(Notify::new());

    let reaper = TtlReaper::new(sm.clone(), LoopbackReaperTransport::new(config.addr.clone()));
    tokio::spawn(reaper.run());

    let listener = TcpListener::bind(&config.addr).await?;
    log::info!("listening on {}", config.addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                log::debug!("accepted connection from {peer}");
                let sm = sm.clone();
                let applier = applier.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(connection::handle(stream, sm, applier, shutdown));
            }
            _ = shutdown.notified() => {
                log::info!("shutting down");
                return Ok(());
            }
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn to_io_error(e: redikv_types::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}
