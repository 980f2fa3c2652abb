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

//! Drives a `StoreIterator` across a glob-bounded sweep of the `'k'` family
//! for `KEYS`, honoring `PIVOT`/`LIMIT`/`DESC`.

use redikv_store::StoreIterator;

use crate::glob;
use crate::keycodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

pub struct ScanRequest<'a> {
    pub pattern: &'a [u8],
    pub pivot: Option<&'a [u8]>,
    pub limit: usize,
    pub direction: Direction,
}

/// One matched `'k'`-family entry, with the family tag already stripped.
pub struct ScanHit {
    pub user_key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Sweeps `iter` for up to `request.limit` keys in the `'k'` family whose
/// user key matches `request.pattern`. An empty pattern matches nothing and
/// short-circuits without touching the iterator.
pub fn scan(iter: &mut dyn StoreIterator, request: &ScanRequest<'_>) -> Vec<ScanHit> {
    if request.pattern.is_empty() || request.limit == 0 {
        return Vec::new();
    }

    let mut full_pattern = Vec::with_capacity(1 + request.pattern.len());
    full_pattern.push(keycodec::FAMILY_DATA);
    full_pattern.extend_from_slice(request.pattern);

    let (min, max) = glob::allowable(&full_pattern);

    let mut hits = Vec::new();
    position(iter, &min, &max, request.pivot, request.direction);

    while iter.valid() && hits.len() < request.limit {
        let key = iter.key().unwrap().to_vec();
        if keycodec::decode_family(&key) != Some(keycodec::FAMILY_DATA) {
            break;
        }
        match request.direction {
            Direction::Asc => {
                if let Some(max) = &max {
                    if key.as_slice() >= max.as_slice() {
                        break;
                    }
                }
            }
            Direction::Desc => {
                if key.as_slice() < min.as_slice() {
                    break;
                }
            }
        }

        if glob::matches(&full_pattern, &key) {
            let value = iter.value().unwrap().to_vec();
            hits.push(ScanHit {
                user_key: keycodec::strip_family(&key).to_vec(),
                value,
            });
        }

        match request.direction {
            Direction::Asc => iter.next(),
            Direction::Desc => iter.prev(),
        }
    }

    hits
}

fn position(
    iter: &mut dyn StoreIterator,
    min: &[u8],
    max: &Option<Vec<u8>>,
    pivot: Option<&[u8]>,
    direction: Direction,
) {
    if let Some(pivot) = pivot {
        let mut full_pivot = Vec::with_capacity(1 + pivot.len());
        full_pivot.push(keycodec::FAMILY_DATA);
        full_pivot.extend_from_slice(pivot);

        match direction {
            Direction::Asc => {
                iter.seek(&full_pivot);
                // PIVOT is exclusive: if the seek landed exactly on the
                // pivot itself, step past it.
                if iter.valid() && iter.key() == Some(full_pivot.as_slice()) {
                    iter.next();
                }
            }
            Direction::Desc => {
                iter.seek(&full_pivot);
                if iter.valid() && iter.key() == Some(full_pivot.as_slice()) {
                    iter.prev();
                } else if iter.valid() {
                    // seek lands on the first key >= pivot; for a
                    // descending, exclusive-pivot scan we want the last key
                    // strictly less than the pivot.
                    iter.prev();
                } else {
                    iter.last();
                }
            }
        }
        return;
    }

    match direction {
        Direction::Asc => iter.seek(min),
        Direction::Desc => match max {
            Some(max) => {
                iter.seek(max);
                if iter.valid() {
                    iter.prev();
                } else {
                    iter.last();
                }
            }
            None => iter.last(),
        },
    }
}

#[cfg(test)]
mod tests {
    use redikv_sled_store::SledStore;
    use redikv_sled_store::SledStoreOptions;
    use redikv_store::Store;

    use super::*;

    fn store_with(pairs: &[(&str, &str)]) -> (tempfile::TempDir, SledStore) {
        let dir = tempfile::tempdir().unwrap();
        let store =
            SledStore::open(SledStoreOptions::new(dir.path().join("node.db"), false)).unwrap();
        for (k, v) in pairs {
            store
                .put(&keycodec::encode(keycodec::FAMILY_DATA, k.as_bytes()), v.as_bytes())
                .unwrap();
        }
        (dir, store)
    }

    #[test]
    fn ascending_prefix_scan() {
        let (_dir, store) = store_with(&[("foo", "1"), ("foobar", "2"), ("bar", "3")]);
        let mut iter = store.new_iterator();
        let hits = scan(
            &mut *iter,
            &ScanRequest {
                pattern: b"foo*",
                pivot: None,
                limit: 10,
                direction: Direction::Asc,
            },
        );
        let keys: Vec<_> = hits.iter().map(|h| h.user_key.clone()).collect();
        assert_eq!(keys, vec![b"foo".to_vec(), b"foobar".to_vec()]);
    }

    #[test]
    fn descending_scan_respects_limit() {
        let (_dir, store) = store_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut iter = store.new_iterator();
        let hits = scan(
            &mut *iter,
            &ScanRequest {
                pattern: b"*",
                pivot: None,
                limit: 2,
                direction: Direction::Desc,
            },
        );
        let keys: Vec<_> = hits.iter().map(|h| h.user_key.clone()).collect();
        assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn pivot_is_exclusive() {
        let (_dir, store) = store_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut iter = store.new_iterator();
        let hits = scan(
            &mut *iter,
            &ScanRequest {
                pattern: b"*",
                pivot: Some(b"b"),
                limit: 10,
                direction: Direction::Asc,
            },
        );
        let keys: Vec<_> = hits.iter().map(|h| h.user_key.clone()).collect();
        assert_eq!(keys, vec![b"c".to_vec()]);
    }

    #[test]
    fn empty_pattern_matches_nothing() {
        let (_dir, store) = store_with(&[("a", "1")]);
        let mut iter = store.new_iterator();
        let hits = scan(
            &mut *iter,
            &ScanRequest {
                pattern: b"",
                pivot: None,
                limit: 10,
                direction: Direction::Asc,
            },
        );
        assert!(hits.is_empty());
    }
}
