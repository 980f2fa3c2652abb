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

//! Wire format for `DUMP` and for installing a received snapshot: gzip over
//! a flat stream of little-endian-length-prefixed records, key then value,
//! repeating. The length prefixes are little-endian even though
//! `'x'`-family keys are encoded big-endian -- the snapshot wire format and
//! the store's sort order are two different concerns and happen to disagree
//! on endianness; that is intentional, not a bug to "fix" into consistency.

use std::io::Read;
use std::io::Write;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use redikv_types::Error;

/// Chosen well below the Go original's ~50MiB, per this system's tighter
/// memory budget for snapshot installation.
pub const SOFT_FLUSH_THRESHOLD_BYTES: usize = 4 * 1024 * 1024;

pub fn encode<W: Write>(writer: W, entries: &[(Vec<u8>, Vec<u8>)]) -> Result<(), Error> {
    let mut gz = GzEncoder::new(writer, Compression::default());
    for (k, v) in entries {
        write_record(&mut gz, k)?;
        write_record(&mut gz, v)?;
    }
    gz.finish().map_err(io_err)?;
    Ok(())
}

fn write_record<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), Error> {
    let mut len_buf = [0u8; 8];
    LittleEndian::write_u64(&mut len_buf, bytes.len() as u64);
    w.write_all(&len_buf).map_err(io_err)?;
    w.write_all(bytes).map_err(io_err)?;
    Ok(())
}

/// Streams key/value pairs out of a gzip snapshot, calling `on_pair` for
/// each and `on_threshold` every time at least
/// [`SOFT_FLUSH_THRESHOLD_BYTES`] of payload has been delivered since the
/// last call, so the caller (typically installing into a `Store`) can
/// commit in bounded-size batches instead of buffering the whole snapshot.
pub fn decode<R: Read>(
    reader: R,
    mut on_pair: impl FnMut(Vec<u8>, Vec<u8>) -> Result<(), Error>,
    mut on_threshold: impl FnMut() -> Result<(), Error>,
) -> Result<(), Error> {
    let mut gz = GzDecoder::new(reader);
    let mut since_flush = 0usize;
    loop {
        let Some(key) = read_record(&mut gz)? else {
            break;
        };
        let value = read_record(&mut gz)?
            .ok_or_else(|| Error::Corrupt("snapshot stream truncated: missing value".into()))?;
        since_flush += key.len() + value.len();
        on_pair(key, value)?;
        if since_flush >= SOFT_FLUSH_THRESHOLD_BYTES {
            on_threshold()?;
            since_flush = 0;
        }
    }
    Ok(())
}

fn read_record<R: Read>(r: &mut R) -> Result<Option<Vec<u8>>, Error> {
    let mut len_buf = [0u8; 8];
    match r.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_err(e)),
    }
    let len = LittleEndian::read_u64(&len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(io_err)?;
    Ok(Some(buf))
}

fn io_err(e: std::io::Error) -> Error {
    Error::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_handful_of_entries() {
        let entries = vec![
            (b"k1".to_vec(), b"v1".to_vec()),
            (b"e1".to_vec(), vec![0u8; 16]),
            (b"k2".to_vec(), b"".to_vec()),
        ];
        let mut buf = Vec::new();
        encode(&mut buf, &entries).unwrap();

        let mut decoded = Vec::new();
        decode(
            &buf[..],
            |k, v| {
                decoded.push((k, v));
                Ok(())
            },
            || Ok(()),
        )
        .unwrap();

        assert_eq!(decoded, entries);
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let entries = vec![(b"k1".to_vec(), b"v1".to_vec())];
        let mut buf = Vec::new();
        encode(&mut buf, &entries).unwrap();
        buf.truncate(buf.len() - 3);

        let result = decode(&buf[..], |_, _| Ok(()), || Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn threshold_callback_fires_for_large_payloads() {
        let big_value = vec![7u8; SOFT_FLUSH_THRESHOLD_BYTES + 1];
        let entries = vec![(b"k".to_vec(), big_value)];
        let mut buf = Vec::new();
        encode(&mut buf, &entries).unwrap();

        let mut flushes = 0;
        decode(&buf[..], |_, _| Ok(()), || {
            flushes += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(flushes, 1);
    }
}
