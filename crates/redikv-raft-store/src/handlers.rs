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

//! Per-command logic. Every handler builds an `Action` describing what it
//! wants done and hands it to the `Applier`; none of them touch a lock or a
//! log directly.
//!
//! `SHUTDOWN` is the one command that never reaches an `Applier` -- it is
//! not replicated. `dispatch` still answers it so callers get a uniform
//! `Reply`, but it is the caller's job to close the connection and stop the
//! process once it sees that command go by.

use std::sync::Arc;

use redikv_store::Store;
use redikv_store::WriteBatch;
use redikv_types::ApplyIndex;
use redikv_types::Error;
use redikv_types::ExpireKey;
use redikv_types::Reply;

use crate::applier::Action;
use crate::applier::Applier;
use crate::applier::MutateFn;
use crate::applier::MutationOutcome;
use crate::applier::RespondFn;
use crate::clock;
use crate::command::Command;
use crate::keycodec;
use crate::range;
use crate::range::ScanRequest;
use crate::state_machine::StateMachine;

pub async fn dispatch(
    sm: &Arc<StateMachine>,
    applier: &dyn Applier,
    command: Command,
) -> Result<Reply, Error> {
    match command {
        Command::Set {
            key,
            value,
            ex_seconds,
        } => set(sm, applier, key, value, ex_seconds).await,
        Command::Get { key } => get(sm, applier, key).await,
        Command::Del { keys } => del(sm, applier, keys).await,
        Command::Keys {
            pattern,
            with_values,
            direction,
            pivot,
            limit,
        } => keys(sm, applier, pattern, with_values, direction, pivot, limit).await,
        Command::Dump => dump(sm, applier).await,
        Command::Listex { limit } => listex(sm, applier, limit).await,
        Command::Delif { max_index, keys } => delif(sm, applier, max_index, keys).await,
        Command::Flushdb => flushdb(sm, applier).await,
        Command::Shutdown => Ok(Reply::ok()),
    }
}

async fn set(
    sm: &Arc<StateMachine>,
    applier: &dyn Applier,
    key: Vec<u8>,
    value: Vec<u8>,
    ex_seconds: Option<f64>,
) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let mutate: MutateFn = Box::new(move |apply_index| {
        let data_key = keycodec::encode(keycodec::FAMILY_DATA, &key);
        let expire_key = keycodec::encode(keycodec::FAMILY_EXPIRE, &key);

        let mut batch = WriteBatch::new();

        // Stale expiration from a previous SET on this key: its 'x' index
        // entry is keyed by the old deadline, so it has to be found and
        // removed explicitly -- it is not colocated with the 'e' record.
        if let Some(old_e) = store.get(&expire_key)? {
            let old = keycodec::decode_e_value(&old_e)?;
            batch.delete(keycodec::encode_x(old, &key));
        }

        match ex_seconds {
            Some(seconds) => {
                let delta_ns = (seconds * 1_000_000_000.0).round() as u64;
                let expire = ExpireKey::new(clock::now_ns() + delta_ns, apply_index);
                batch.put(expire_key, keycodec::encode_e_value(expire).to_vec());
                batch.put(keycodec::encode_x(expire, &key), Vec::new());
            }
            None => {
                batch.delete(expire_key);
            }
        }

        batch.put(data_key, value);
        store.write(batch)?;
        Ok(MutationOutcome::Unit)
    });

    let respond: RespondFn = Box::new(|_| Ok(Reply::ok()));

    applier
        .apply("SET", Action::Write { mutate, respond })
        .await
}

async fn get(sm: &Arc<StateMachine>, applier: &dyn Applier, key: Vec<u8>) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let read = Box::new(move || {
        let data_key = keycodec::encode(keycodec::FAMILY_DATA, &key);
        match store.get(&data_key)? {
            Some(value) => Ok(Reply::bulk(value)),
            None => Ok(Reply::NullBulk),
        }
    });
    applier.apply("GET", Action::Read(read)).await
}

async fn del(
    sm: &Arc<StateMachine>,
    applier: &dyn Applier,
    keys: Vec<Vec<u8>>,
) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let mutate: MutateFn = Box::new(move |_apply_index| {
        let mut batch = WriteBatch::new();
        let mut deleted = 0usize;

        for key in &keys {
            let data_key = keycodec::encode(keycodec::FAMILY_DATA, key);
            if !store.has(&data_key)? {
                continue;
            }
            deleted += 1;
            batch.delete(data_key);

            // Each key's own 'e' record is looked up fresh on every
            // iteration; reusing a previous iteration's expiration here
            // would delete the wrong 'x' entry.
            let expire_key = keycodec::encode(keycodec::FAMILY_EXPIRE, key);
            if let Some(raw_e) = store.get(&expire_key)? {
                let expire = keycodec::decode_e_value(&raw_e)?;
                batch.delete(expire_key);
                batch.delete(keycodec::encode_x(expire, key));
            }
        }

        store.write(batch)?;
        Ok(MutationOutcome::Count(deleted))
    });

    let respond: RespondFn = Box::new(|outcome| match outcome {
        MutationOutcome::Count(n) => Ok(Reply::Integer(n as i64)),
        MutationOutcome::Unit => Err(Error::Corrupt("DEL produced no count".into())),
    });

    applier
        .apply("DEL", Action::Write { mutate, respond })
        .await
}

#[allow(clippy::too_many_arguments)]
async fn keys(
    sm: &Arc<StateMachine>,
    applier: &dyn Applier,
    pattern: Vec<u8>,
    with_values: bool,
    direction: range::Direction,
    pivot: Option<Vec<u8>>,
    limit: usize,
) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let read = Box::new(move || {
        let mut iter = store.new_iterator();
        let hits = range::scan(
            &mut *iter,
            &ScanRequest {
                pattern: &pattern,
                pivot: pivot.as_deref(),
                limit,
                direction,
            },
        );

        if with_values {
            let mut items = Vec::with_capacity(hits.len() * 2);
            for hit in hits {
                items.push(Reply::bulk(hit.user_key));
                items.push(Reply::bulk(hit.value));
            }
            Ok(Reply::Array(items))
        } else {
            Ok(Reply::array_of_bulks(hits.into_iter().map(|hit| hit.user_key)))
        }
    });
    applier.apply("KEYS", Action::Read(read)).await
}

async fn dump(sm: &Arc<StateMachine>, applier: &dyn Applier) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let read = Box::new(move || {
        let snapshot = store.snapshot()?;
        let mut iter = snapshot.new_iterator();
        iter.first();

        let mut items = Vec::new();
        while iter.valid() {
            // Unlike KEYS, DUMP hands back the raw store key, family tag
            // and all -- a flat dump of every family, not just 'k'.
            items.push(Reply::bulk(iter.key().unwrap().to_vec()));
            items.push(Reply::bulk(iter.value().unwrap().to_vec()));
            iter.next();
        }
        Ok(Reply::Array(items))
    });
    applier.apply("DUMP", Action::Read(read)).await
}

async fn listex(sm: &Arc<StateMachine>, applier: &dyn Applier, limit: u64) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let read = Box::new(move || {
        let now = clock::now_ns();
        let snapshot = store.snapshot()?;
        let mut iter = snapshot.new_iterator();
        iter.seek(&[keycodec::FAMILY_EXPIRE_INDEX]);

        let mut items = Vec::new();
        let mut count = 0u64;
        while iter.valid() && count < limit {
            let raw_key = iter.key().unwrap();
            if keycodec::decode_family(raw_key) != Some(keycodec::FAMILY_EXPIRE_INDEX) {
                break;
            }
            let (expire, user_key) = keycodec::parse_x(raw_key)?;
            if !expire.is_expired(now) {
                // 'x' sorts by deadline ascending, so the first unexpired
                // entry means every entry after it is unexpired too.
                break;
            }
            items.push(Reply::bulk(user_key.to_vec()));
            items.push(Reply::bulk(expire.apply_index.to_string().into_bytes()));
            count += 1;
            iter.next();
        }
        Ok(Reply::Array(items))
    });
    applier.apply("LISTEX", Action::Read(read)).await
}

async fn delif(
    sm: &Arc<StateMachine>,
    applier: &dyn Applier,
    max_index: ApplyIndex,
    keys: Vec<Vec<u8>>,
) -> Result<Reply, Error> {
    let store = sm.store_handle();
    let mutate: MutateFn = Box::new(move |_apply_index| {
        let mut batch = WriteBatch::new();
        for key in &keys {
            let expire_key = keycodec::encode(keycodec::FAMILY_EXPIRE, key);
            let Some(raw_e) = store.get(&expire_key)? else {
                // Already gone, or never had a TTL -- idempotent no-op.
                continue;
            };
            let expire = keycodec::decode_e_value(&raw_e)?;
            if expire.apply_index > max_index {
                // A newer SET raced this DELIF; leave the fresher record.
                continue;
            }
            batch.delete(keycodec::encode(keycodec::FAMILY_DATA, key));
            batch.delete(expire_key);
            batch.delete(keycodec::encode_x(expire, key));
        }
        store.write(batch)?;
        Ok(MutationOutcome::Unit)
    });
    let respond: RespondFn = Box::new(|_| Ok(Reply::ok()));
    applier
        .apply("DELIF", Action::Write { mutate, respond })
        .await
}

async fn flushdb(sm: &Arc<StateMachine>, applier: &dyn Applier) -> Result<Reply, Error> {
    let sm = Arc::clone(sm);
    let mutate: MutateFn = Box::new(move |_apply_index| {
        sm.flushdb()?;
        Ok(MutationOutcome::Unit)
    });
    let respond: RespondFn = Box::new(|_| Ok(Reply::ok()));
    applier
        .apply("FLUSHDB", Action::Write { mutate, respond })
        .await
}
