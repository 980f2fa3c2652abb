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

use std::path::PathBuf;

use clap::Parser;

/// Command-line configuration for a single node: one flat `clap::Parser`
/// struct, long-form flags, explicit defaults.
#[derive(Debug, Clone, Parser)]
#[clap(about = "A replicated, embedded key-value store node", version)]
pub struct Config {
    /// Address this node listens on for client connections.
    #[clap(long, env = "REDIKV_ADDR", default_value = "127.0.0.1:7878")]
    pub addr: String,

    /// Directory this node persists its data under.
    #[clap(long, env = "REDIKV_DATA", default_value = "./data")]
    pub data: PathBuf,

    /// Address of an existing cluster member to join. Accepted and logged
    /// only: this build has no consensus engine to actually join a
    /// cluster with.
    #[clap(long, env = "REDIKV_JOIN")]
    pub join: Option<String>,

    /// Read consistency level forwarded unchanged to the Applier. This
    /// single-node build only ever reads locally, so every level behaves
    /// like `low`; the flag is accepted so a config file shared with a real
    /// cluster deployment does not need to be edited.
    #[clap(long, env = "REDIKV_CONSISTENCY", default_value = "low")]
    pub consistency: Consistency,

    /// Durability level forwarded unchanged to the Applier. Only `high`
    /// flushes every write to disk before replying; `low`/`medium` batch
    /// flushes for throughput.
    #[clap(long, env = "REDIKV_DURABILITY", default_value = "high")]
    pub durability: Durability,

    #[clap(long, env = "REDIKV_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Consistency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Durability {
    Low,
    Medium,
    High,
}

impl Durability {
    pub fn is_sync(self) -> bool {
        matches!(self, Durability::High)
    }
}
