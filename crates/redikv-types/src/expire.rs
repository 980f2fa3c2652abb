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

use byteorder::BigEndian;
use byteorder::ByteOrder;

use crate::ApplyIndex;
use crate::Error;
use crate::TimestampNanos;

/// The 16-byte `(expiration_ns, apply_index)` pair stored as the value of an
/// `'e'` record and as the sort-order-sensitive prefix of an `'x'` record.
/// Big-endian so that byte order equals numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpireKey {
    pub expire_at_ns: TimestampNanos,
    pub apply_index: ApplyIndex,
}

impl ExpireKey {
    pub const ENCODED_LEN: usize = 16;

    pub fn new(expire_at_ns: TimestampNanos, apply_index: ApplyIndex) -> Self {
        Self {
            expire_at_ns,
            apply_index,
        }
    }

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        BigEndian::write_u64(&mut buf[0..8], self.expire_at_ns);
        BigEndian::write_u64(&mut buf[8..16], self.apply_index);
        buf
    }

    /// Decode a 16-byte `'e'` value. Returns `Error::Corrupt` if the slice
    /// is not exactly 16 bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Error::Corrupt(format!(
                "invalid exkey value: expected {} bytes, got {}",
                Self::ENCODED_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            expire_at_ns: BigEndian::read_u64(&bytes[0..8]),
            apply_index: BigEndian::read_u64(&bytes[8..16]),
        })
    }

    pub fn is_expired(&self, now_ns: TimestampNanos) -> bool {
        self.expire_at_ns <= now_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let k = ExpireKey::new(1_700_000_000_000_000_000, 42);
        let encoded = k.encode();
        assert_eq!(ExpireKey::decode(&encoded).unwrap(), k);
    }

    #[test]
    fn byte_order_matches_numeric_order() {
        let a = ExpireKey::new(10, 0).encode();
        let b = ExpireKey::new(10, 1).encode();
        let c = ExpireKey::new(11, 0).encode();
        assert!(a.as_slice() < b.as_slice());
        assert!(b.as_slice() < c.as_slice());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ExpireKey::decode(&[0u8; 8]).is_err());
    }
}
