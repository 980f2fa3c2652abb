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

//! A RESP-style framer: requests are arrays of bulk strings
//! (`*N\r\n$len\r\n...\r\n`...), replies are simple strings, bulk strings,
//! the null bulk string, integers, arrays, or errors. RESP is what
//! `redis-cli` and friends already speak, which matters for a store whose
//! command surface is explicitly Redis-flavored.

use redikv_types::Error;
use redikv_types::Reply;

/// Result of trying to decode one frame out of a buffer that may not yet
/// hold a complete frame.
pub enum Decoded<T> {
    /// `consumed` bytes at the front of the buffer made up this value; the
    /// caller should advance its buffer by that amount.
    Complete { value: T, consumed: usize },
    /// Not enough bytes buffered yet; call again once more has arrived.
    Incomplete,
}

pub fn encode_command(args: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}

pub fn encode_reply(reply: &Reply, out: &mut Vec<u8>) {
    match reply {
        Reply::Simple(s) => {
            out.push(b'+');
            out.extend_from_slice(s.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Reply::Error(msg) => {
            out.push(b'-');
            out.extend_from_slice(msg.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Reply::Integer(n) => {
            out.push(b':');
            out.extend_from_slice(n.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Reply::NullBulk => out.extend_from_slice(b"$-1\r\n"),
        Reply::Bulk(bytes) => {
            out.push(b'$');
            out.extend_from_slice(bytes.len().to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(bytes);
            out.extend_from_slice(b"\r\n");
        }
        Reply::Array(items) => {
            out.push(b'*');
            out.extend_from_slice(items.len().to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
            for item in items {
                encode_reply(item, out);
            }
        }
    }
}

/// Decodes one client request -- an array of bulk strings -- from the
/// front of `buf`. Any other top-level type is a syntax error; RESP's
/// inline-command shorthand is not supported.
pub fn decode_command(buf: &[u8]) -> Result<Decoded<Vec<Vec<u8>>>, Error> {
    let mut pos = 0;
    let Some(header) = read_line(buf, &mut pos)? else {
        return Ok(Decoded::Incomplete);
    };
    if header.first() != Some(&b'*') {
        return Err(Error::Syntax);
    }
    let count: usize = parse_len(&header[1..])?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(bulk_header) = read_line(buf, &mut pos)? else {
            return Ok(Decoded::Incomplete);
        };
        if bulk_header.first() != Some(&b'$') {
            return Err(Error::Syntax);
        }
        let len: usize = parse_len(&bulk_header[1..])?;
        if buf.len() < pos + len + 2 {
            return Ok(Decoded::Incomplete);
        }
        args.push(buf[pos..pos + len].to_vec());
        pos += len + 2;
    }

    Ok(Decoded::Complete {
        value: args,
        consumed: pos,
    })
}

/// Decodes one reply from the front of `buf`, as a client talking back to
/// this server (or the reaper's self-loopback client) would need to.
pub fn decode_reply(buf: &[u8]) -> Result<Decoded<Reply>, Error> {
    let mut pos = 0;
    decode_reply_at(buf, &mut pos).map(|outcome| match outcome {
        Some(value) => Decoded::Complete { value, consumed: pos },
        None => Decoded::Incomplete,
    })
}

fn decode_reply_at(buf: &[u8], pos: &mut usize) -> Result<Option<Reply>, Error> {
    let Some(line) = read_line(buf, pos)? else {
        return Ok(None);
    };
    let Some((&tag, body)) = line.split_first() else {
        return Err(Error::Syntax);
    };

    match tag {
        b'+' => Ok(Some(Reply::Simple(to_utf8(body)?))),
        b'-' => Ok(Some(Reply::Error(to_utf8(body)?))),
        b':' => Ok(Some(Reply::Integer(parse_signed(body)?))),
        b'$' => {
            let len: i64 = parse_signed(body)?;
            if len < 0 {
                return Ok(Some(Reply::NullBulk));
            }
            let len = len as usize;
            if buf.len() < *pos + len + 2 {
                // Roll back: the header line was consumed but the body is
                // not here yet. Signal "incomplete" to the outer call by
                // returning None and letting the caller re-decode from
                // scratch once more data arrives.
                return Ok(None);
            }
            let bytes = buf[*pos..*pos + len].to_vec();
            *pos += len + 2;
            Ok(Some(Reply::Bulk(bytes)))
        }
        b'*' => {
            let count: i64 = parse_signed(body)?;
            if count < 0 {
                return Ok(Some(Reply::Array(Vec::new())));
            }
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                match decode_reply_at(buf, pos)? {
                    Some(item) => items.push(item),
                    None => return Ok(None),
                }
            }
            Ok(Some(Reply::Array(items)))
        }
        _ => Err(Error::Syntax),
    }
}

fn read_line<'a>(buf: &'a [u8], pos: &mut usize) -> Result<Option<&'a [u8]>, Error> {
    let start = *pos;
    let Some(rel) = buf[start..].windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };
    let end = start + rel;
    *pos = end + 2;
    Ok(Some(&buf[start..end]))
}

fn to_utf8(bytes: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| Error::Syntax)
}

fn parse_len(bytes: &[u8]) -> Result<usize, Error> {
    to_utf8(bytes)?.parse().map_err(|_| Error::Syntax)
}

fn parse_signed<T: std::str::FromStr>(bytes: &[u8]) -> Result<T, Error> {
    to_utf8(bytes)?.parse().map_err(|_| Error::Syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_command() {
        let args = vec![b"SET".to_vec(), b"k".to_vec(), b"v".to_vec()];
        let wire = encode_command(&args);
        match decode_command(&wire).unwrap() {
            Decoded::Complete { value, consumed } => {
                assert_eq!(value, args);
                assert_eq!(consumed, wire.len());
            }
            Decoded::Incomplete => panic!("expected complete frame"),
        }
    }

    #[test]
    fn command_reports_incomplete_on_partial_buffer() {
        let wire = encode_command(&[b"GET".to_vec(), b"k".to_vec()]);
        let partial = &wire[..wire.len() - 2];
        assert!(matches!(
            decode_command(partial).unwrap(),
            Decoded::Incomplete
        ));
    }

    #[test]
    fn round_trips_every_reply_shape() {
        let replies = vec![
            Reply::ok(),
            Reply::Error("ERR bad".to_string()),
            Reply::Integer(42),
            Reply::NullBulk,
            Reply::bulk(b"hello".to_vec()),
            Reply::Array(vec![Reply::Integer(1), Reply::bulk(b"x".to_vec())]),
        ];
        for reply in replies {
            let mut wire = Vec::new();
            encode_reply(&reply, &mut wire);
            match decode_reply(&wire).unwrap() {
                Decoded::Complete { value, consumed } => {
                    assert_eq!(consumed, wire.len());
                    assert_eq!(format_reply(&value), format_reply(&reply));
                }
                Decoded::Incomplete => panic!("expected complete frame"),
            }
        }
    }

    fn format_reply(r: &Reply) -> String {
        let mut buf = Vec::new();
        encode_reply(r, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn rejects_non_array_command() {
        assert!(decode_command(b"+OK\r\n").is_err());
    }
}
