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

//! The wire protocol layer: a RESP-style command decoder, reply encoder,
//! and a small client for the cases where this system talks to itself
//! (the TTL reaper's self-loopback calls).

mod client;
mod wire;

pub use client::Client;
pub use wire::decode_command;
pub use wire::decode_reply;
pub use wire::encode_command;
pub use wire::encode_reply;
pub use wire::Decoded;
