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

//! Glob matching and bound derivation over raw bytes. This is hand-rolled
//! rather than farmed to a crate: `KEYS`'s pattern is matched directly
//! against the full store key (family tag byte included), so the matcher
//! has to operate on arbitrary bytes, not `&str`, and the bound derivation
//! (`allowable`) is the one piece of this system's logic that has no
//! off-the-shelf equivalent.
//!
//! Supported syntax: `*` (any run, including empty), `?` (exactly one
//! byte), `[abc]`/`[a-z]` (one byte from a class), `[^abc]` (negated
//! class), and `\` to escape the next byte literally.

/// Returns `true` if `text` matches `pattern`.
pub fn matches(pattern: &[u8], text: &[u8]) -> bool {
    match_from(pattern, text)
}

fn match_from(mut pattern: &[u8], mut text: &[u8]) -> bool {
    // Backtracking matcher: on a `*`, try consuming zero bytes of text and
    // fall back to consuming one more byte from `text` each time the rest
    // of the pattern fails to match.
    let mut star_pattern: Option<&[u8]> = None;
    let mut star_text: &[u8] = text;

    loop {
        if let Some((&p0, prest)) = pattern.split_first() {
            match p0 {
                b'*' => {
                    star_pattern = Some(prest);
                    star_text = text;
                    pattern = prest;
                    continue;
                }
                b'?' => {
                    if let Some((_, trest)) = text.split_first() {
                        pattern = prest;
                        text = trest;
                        continue;
                    }
                }
                b'[' => {
                    if let Some((consumed, class_matched, remaining_pattern)) =
                        match_class(prest, text.first().copied())
                    {
                        if class_matched && consumed {
                            pattern = remaining_pattern;
                            text = &text[1..];
                            continue;
                        }
                    }
                }
                b'\\' => {
                    if let Some((&esc, prest2)) = prest.split_first() {
                        if let Some((&t0, trest)) = text.split_first() {
                            if esc == t0 {
                                pattern = prest2;
                                text = trest;
                                continue;
                            }
                        }
                    }
                }
                literal => {
                    if let Some((&t0, trest)) = text.split_first() {
                        if literal == t0 {
                            pattern = prest;
                            text = trest;
                            continue;
                        }
                    }
                }
            }
        } else {
            return text.is_empty();
        }

        // current attempt failed -- backtrack to the last `*`, if any.
        match star_pattern {
            Some(sp) if !star_text.is_empty() => {
                star_text = &star_text[1..];
                text = star_text;
                pattern = sp;
            }
            _ => return false,
        }
    }
}

/// Parses a `[...]` class starting just after the `[`. Returns
/// `(consumed_one_byte, matched, pattern_after_class)`.
fn match_class(spec: &[u8], byte: Option<u8>) -> Option<(bool, bool, &[u8])> {
    let negate = spec.first() == Some(&b'^');
    let body_start = if negate { 1 } else { 0 };
    let close = spec[body_start..].iter().position(|&b| b == b']')?;
    let body = &spec[body_start..body_start + close];
    let rest = &spec[body_start + close + 1..];

    let Some(byte) = byte else {
        return Some((false, false, rest));
    };

    let mut hit = false;
    let mut i = 0;
    while i < body.len() {
        if i + 2 < body.len() && body[i + 1] == b'-' {
            if body[i] <= byte && byte <= body[i + 2] {
                hit = true;
            }
            i += 3;
        } else {
            if body[i] == byte {
                hit = true;
            }
            i += 1;
        }
    }
    let matched = hit != negate;
    Some((true, matched, rest))
}

/// Derives the tightest `[min, max)` half-open byte range that every string
/// matching `pattern` must fall within. `None` for the upper bound means
/// unbounded above (pattern has no fixed literal prefix, e.g. `"*"`).
///
/// This only inspects the pattern's literal prefix up to its first special
/// character; it does not attempt to narrow based on character classes or
/// trailing literals, matching the standard prefix-bound technique used by
/// ordered-store range scans.
pub fn allowable(pattern: &[u8]) -> (Vec<u8>, Option<Vec<u8>>) {
    let mut prefix_len = 0;
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            b'*' | b'?' | b'[' | b'\\' => break,
            _ => {
                prefix_len = i + 1;
                i += 1;
            }
        }
    }

    let min = pattern[..prefix_len].to_vec();
    if prefix_len == 0 {
        return (min, None);
    }
    (min.clone(), increment_bound(&min))
}

/// The smallest byte string that is strictly greater than every string
/// starting with `prefix`, or `None` if no such bound exists (prefix is all
/// `0xFF` bytes).
fn increment_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    while let Some(&last) = bound.last() {
        if last == 0xFF {
            bound.pop();
            continue;
        }
        *bound.last_mut().unwrap() += 1;
        return Some(bound);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_only_itself() {
        assert!(matches(b"kfoo", b"kfoo"));
        assert!(!matches(b"kfoo", b"kfoobar"));
    }

    #[test]
    fn star_matches_any_run() {
        assert!(matches(b"k*", b"kfoo"));
        assert!(matches(b"k*", b"k"));
        assert!(matches(b"k*bar", b"kfoobar"));
        assert!(!matches(b"k*bar", b"kfoobaz"));
    }

    #[test]
    fn question_mark_matches_one_byte() {
        assert!(matches(b"k?oo", b"kfoo"));
        assert!(!matches(b"k?oo", b"koo"));
    }

    #[test]
    fn class_and_negated_class() {
        assert!(matches(b"k[aeiou]o", b"kao"));
        assert!(!matches(b"k[aeiou]o", b"kbo"));
        assert!(matches(b"k[^aeiou]o", b"kbo"));
        assert!(matches(b"k[a-c]x", b"kbx"));
    }

    #[test]
    fn allowable_literal_prefix_gives_tight_bounds() {
        let (min, max) = allowable(b"kfoo");
        assert_eq!(min, b"kfoo");
        assert_eq!(max, Some(b"kfop".to_vec()));
    }

    #[test]
    fn allowable_wildcard_prefix_is_unbounded() {
        let (min, max) = allowable(b"*");
        assert_eq!(min, b"");
        assert_eq!(max, None);
    }

    #[test]
    fn allowable_mixed_prefix_stops_at_wildcard() {
        let (min, max) = allowable(b"k*foo");
        assert_eq!(min, b"k");
        assert_eq!(max, Some(b"l".to_vec()));
    }

    #[test]
    fn allowable_all_0xff_prefix_is_unbounded_above() {
        let (min, max) = allowable(&[0xFF, 0xFF]);
        assert_eq!(min, vec![0xFF, 0xFF]);
        assert_eq!(max, None);
    }
}
