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

//! Parses a decoded wire request (command name plus raw argument bytes)
//! into a typed `Command`. Keyword matching is ASCII case-insensitive.

use redikv_types::ApplyIndex;
use redikv_types::Error;

use crate::range::Direction;

#[derive(Debug, Clone)]
pub enum Command {
    Set {
        key: Vec<u8>,
        value: Vec<u8>,
        ex_seconds: Option<f64>,
    },
    Get {
        key: Vec<u8>,
    },
    Del {
        keys: Vec<Vec<u8>>,
    },
    Keys {
        pattern: Vec<u8>,
        with_values: bool,
        direction: Direction,
        pivot: Option<Vec<u8>>,
        limit: usize,
    },
    Dump,
    Listex {
        limit: u64,
    },
    Delif {
        max_index: ApplyIndex,
        keys: Vec<Vec<u8>>,
    },
    Flushdb,
    Shutdown,
}

pub const DEFAULT_KEYS_LIMIT: usize = 500;

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Del { .. } => "DEL",
            Command::Keys { .. } => "KEYS",
            Command::Dump => "DUMP",
            Command::Listex { .. } => "LISTEX",
            Command::Delif { .. } => "DELIF",
            Command::Flushdb => "FLUSHDB",
            Command::Shutdown => "SHUTDOWN",
        }
    }

    /// Writes go through the applier's mutate/respond split; reads and
    /// `SHUTDOWN` (never replicated) do not.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set { .. } | Command::Del { .. } | Command::Delif { .. } | Command::Flushdb
        )
    }
}

pub fn parse(args: &[Vec<u8>]) -> Result<Command, Error> {
    let Some((name, rest)) = args.split_first() else {
        return Err(Error::WrongArity);
    };

    match eq_ignore_case(name, b"SET") {
        true => parse_set(rest),
        false => match eq_ignore_case(name, b"GET") {
            true => parse_get(rest),
            false => match eq_ignore_case(name, b"DEL") {
                true => parse_del(rest),
                false => match eq_ignore_case(name, b"KEYS") {
                    true => parse_keys(rest),
                    false => match eq_ignore_case(name, b"DUMP") {
                        true => parse_dump(rest),
                        false => match eq_ignore_case(name, b"LISTEX") {
                            true => parse_listex(rest),
                            false => match eq_ignore_case(name, b"DELIF") {
                                true => parse_delif(rest),
                                false => match eq_ignore_case(name, b"FLUSHDB") {
                                    true => parse_flushdb(rest),
                                    false => match eq_ignore_case(name, b"SHUTDOWN") {
                                        true => parse_shutdown(rest),
                                        false => Err(Error::UnknownCommand),
                                    },
                                },
                            },
                        },
                    },
                },
            },
        },
    }
}

fn eq_ignore_case(a: &[u8], b: &[u8]) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn parse_set(args: &[Vec<u8>]) -> Result<Command, Error> {
    match args {
        [key, value] => Ok(Command::Set {
            key: key.clone(),
            value: value.clone(),
            ex_seconds: None,
        }),
        [key, value, ex, seconds] if eq_ignore_case(ex, b"EX") => {
            let text = std::str::from_utf8(seconds).map_err(|_| Error::Syntax)?;
            let seconds: f64 = text.parse().map_err(|_| Error::Syntax)?;
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(Error::Syntax);
            }
            Ok(Command::Set {
                key: key.clone(),
                value: value.clone(),
                ex_seconds: Some(seconds),
            })
        }
        _ => Err(Error::WrongArity),
    }
}

fn parse_get(args: &[Vec<u8>]) -> Result<Command, Error> {
    match args {
        [key] => Ok(Command::Get { key: key.clone() }),
        _ => Err(Error::WrongArity),
    }
}

fn parse_del(args: &[Vec<u8>]) -> Result<Command, Error> {
    if args.is_empty() {
        return Err(Error::WrongArity);
    }
    Ok(Command::Del {
        keys: args.to_vec(),
    })
}

fn parse_keys(args: &[Vec<u8>]) -> Result<Command, Error> {
    let Some((pattern, mut rest)) = args.split_first() else {
        return Err(Error::WrongArity);
    };

    let mut with_values = false;
    let mut direction = Direction::Asc;
    let mut pivot = None;
    let mut limit = DEFAULT_KEYS_LIMIT;

    while let Some((token, tail)) = rest.split_first() {
        if eq_ignore_case(token, b"WITHVALUES") {
            with_values = true;
            rest = tail;
        } else if eq_ignore_case(token, b"DESC") {
            direction = Direction::Desc;
            rest = tail;
        } else if eq_ignore_case(token, b"PIVOT") {
            let (value, tail) = tail.split_first().ok_or(Error::Syntax)?;
            pivot = Some(value.clone());
            rest = tail;
        } else if eq_ignore_case(token, b"LIMIT") {
            let (value, tail) = tail.split_first().ok_or(Error::Syntax)?;
            let text = std::str::from_utf8(value).map_err(|_| Error::Syntax)?;
            limit = text.parse().map_err(|_| Error::Syntax)?;
            rest = tail;
        } else {
            return Err(Error::Syntax);
        }
    }

    Ok(Command::Keys {
        pattern: pattern.clone(),
        with_values,
        direction,
        pivot,
        limit,
    })
}

fn parse_dump(args: &[Vec<u8>]) -> Result<Command, Error> {
    if !args.is_empty() {
        return Err(Error::WrongArity);
    }
    Ok(Command::Dump)
}

fn parse_listex(args: &[Vec<u8>]) -> Result<Command, Error> {
    match args {
        [limit] => {
            let text = std::str::from_utf8(limit).map_err(|_| Error::Syntax)?;
            let limit: u64 = text.parse().map_err(|_| Error::Syntax)?;
            Ok(Command::Listex { limit })
        }
        _ => Err(Error::WrongArity),
    }
}

fn parse_delif(args: &[Vec<u8>]) -> Result<Command, Error> {
    let Some((max_index, keys)) = args.split_first() else {
        return Err(Error::WrongArity);
    };
    if keys.is_empty() {
        return Err(Error::WrongArity);
    }
    let text = std::str::from_utf8(max_index).map_err(|_| Error::Syntax)?;
    let max_index: ApplyIndex = text.parse().map_err(|_| Error::Syntax)?;
    Ok(Command::Delif {
        max_index,
        keys: keys.to_vec(),
    })
}

fn parse_flushdb(args: &[Vec<u8>]) -> Result<Command, Error> {
    if !args.is_empty() {
        return Err(Error::WrongArity);
    }
    Ok(Command::Flushdb)
}

fn parse_shutdown(args: &[Vec<u8>]) -> Result<Command, Error> {
    if !args.is_empty() {
        return Err(Error::WrongArity);
    }
    Ok(Command::Shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<Vec<u8>> {
        parts.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn parses_set_with_and_without_ex() {
        let cmd = parse(&args(&["SET", "k", "v"])).unwrap();
        assert!(matches!(cmd, Command::Set { ex_seconds: None, .. }));

        let cmd = parse(&args(&["set", "k", "v", "ex", "1.5"])).unwrap();
        match cmd {
            Command::Set { ex_seconds, .. } => assert_eq!(ex_seconds, Some(1.5)),
            _ => panic!("expected Set"),
        }
    }

    #[test]
    fn rejects_negative_ex() {
        assert!(parse(&args(&["SET", "k", "v", "EX", "-1"])).is_err());
    }

    #[test]
    fn parses_keys_with_all_modifiers() {
        let cmd = parse(&args(&[
            "KEYS", "foo*", "WITHVALUES", "DESC", "PIVOT", "foobar", "LIMIT", "10",
        ]))
        .unwrap();
        match cmd {
            Command::Keys {
                pattern,
                with_values,
                direction,
                pivot,
                limit,
            } => {
                assert_eq!(pattern, b"foo*");
                assert!(with_values);
                assert_eq!(direction, Direction::Desc);
                assert_eq!(pivot, Some(b"foobar".to_vec()));
                assert_eq!(limit, 10);
            }
            _ => panic!("expected Keys"),
        }
    }

    #[test]
    fn keys_defaults_limit_to_500() {
        match parse(&args(&["KEYS", "*"])).unwrap() {
            Command::Keys { limit, .. } => assert_eq!(limit, DEFAULT_KEYS_LIMIT),
            _ => panic!("expected Keys"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(
            parse(&args(&["NOPE"])),
            Err(Error::UnknownCommand)
        ));
    }

    #[test]
    fn empty_request_is_wrong_arity() {
        assert!(matches!(parse(&[]), Err(Error::WrongArity)));
    }
}
