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

//! Encodes the three key families that share the single ordered store:
//! `'k'` user data, `'e'` per-key expiration record, and `'x'` expiration
//! index (sorted by deadline, then apply index, then user key).

use byteorder::BigEndian;
use byteorder::ByteOrder;
use redikv_types::ApplyIndex;
use redikv_types::Error;
use redikv_types::ExpireKey;

pub const FAMILY_DATA: u8 = b'k';
pub const FAMILY_EXPIRE: u8 = b'e';
pub const FAMILY_EXPIRE_INDEX: u8 = b'x';

/// `'k'`/`'e'`: one tag byte followed by the user key, verbatim.
pub fn encode(family: u8, user_key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + user_key.len());
    out.push(family);
    out.extend_from_slice(user_key);
    out
}

pub fn decode_family(raw: &[u8]) -> Option<u8> {
    raw.first().copied()
}

/// Panics if `raw` is empty; callers only ever call this on keys they just
/// pulled out of the store, which always carry the tag byte.
pub fn strip_family(raw: &[u8]) -> &[u8] {
    &raw[1..]
}

/// `'x'`: tag byte, 16-byte big-endian `ExpireKey`, then the user key. The
/// big-endian encoding is what makes the index sort by deadline ascending
/// even though the snapshot wire format elsewhere uses little-endian --
/// that asymmetry is deliberate, not an oversight.
pub fn encode_x(expire: ExpireKey, user_key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + ExpireKey::ENCODED_LEN + user_key.len());
    out.push(FAMILY_EXPIRE_INDEX);
    out.extend_from_slice(&expire.encode());
    out.extend_from_slice(user_key);
    out
}

pub const X_PREFIX_LEN: usize = 1 + ExpireKey::ENCODED_LEN;

/// Splits a raw `'x'`-family key into its `ExpireKey` and the user key it
/// guards. Returns `Error::Corrupt` if `raw` is too short or not tagged
/// `'x'` -- both indicate the store or snapshot holds a malformed record.
pub fn parse_x(raw: &[u8]) -> Result<(ExpireKey, &[u8]), Error> {
    if raw.len() < X_PREFIX_LEN || raw[0] != FAMILY_EXPIRE_INDEX {
        return Err(Error::Corrupt(format!(
            "malformed 'x' family key ({} bytes)",
            raw.len()
        )));
    }
    let expire = ExpireKey::decode(&raw[1..X_PREFIX_LEN])?;
    Ok((expire, &raw[X_PREFIX_LEN..]))
}

/// Encodes the 16-byte `'e'` family value: the same `ExpireKey` the `'x'`
/// entry is sorted by, stored alongside the data so `DEL`/`GET` can find a
/// key's current deadline without a range scan.
pub fn encode_e_value(expire: ExpireKey) -> [u8; ExpireKey::ENCODED_LEN] {
    expire.encode()
}

pub fn decode_e_value(raw: &[u8]) -> Result<ExpireKey, Error> {
    ExpireKey::decode(raw)
}

/// `apply_index` as it is carried inside an `ExpireKey`'s big-endian
/// encoding, exposed for handlers that need to decode just that half.
pub fn apply_index_of(raw: &[u8]) -> Option<ApplyIndex> {
    if raw.len() < 16 {
        return None;
    }
    Some(BigEndian::read_u64(&raw[8..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_family_round_trips() {
        let raw = encode(FAMILY_DATA, b"hello");
        assert_eq!(decode_family(&raw), Some(FAMILY_DATA));
        assert_eq!(strip_family(&raw), b"hello");
    }

    #[test]
    fn expire_index_round_trips_and_preserves_order() {
        let a = ExpireKey::new(10, 1);
        let b = ExpireKey::new(20, 1);
        let ka = encode_x(a, b"foo");
        let kb = encode_x(b, b"foo");
        assert!(ka < kb);
        let (decoded, user_key) = parse_x(&ka).unwrap();
        assert_eq!(decoded, a);
        assert_eq!(user_key, b"foo");
    }

    #[test]
    fn parse_x_rejects_short_or_untagged() {
        assert!(parse_x(b"short").is_err());
        let mut bad = encode_x(ExpireKey::new(1, 1), b"k");
        bad[0] = FAMILY_DATA;
        assert!(parse_x(&bad).is_err());
    }
}
