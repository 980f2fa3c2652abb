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

use redikv_store::Snapshot;
use redikv_store::StoreIterator;
use redikv_types::Error;

/// `sled` does not expose a RocksDB/LevelDB-style cheap point-in-time
/// snapshot handle, so `SledSnapshot` materializes the whole key space at
/// capture time into a sorted in-memory vector -- a consistent, ordered
/// view that does not observe writes made after the snapshot was taken.
pub struct SledSnapshot {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl SledSnapshot {
    pub fn capture(tree: &sled::Tree) -> Result<Self, Error> {
        let mut entries = Vec::with_capacity(tree.len());
        for item in tree.iter() {
            let (k, v) = item?;
            entries.push((k.to_vec(), v.to_vec()));
        }
        Ok(Self { entries })
    }
}

impl Snapshot for SledSnapshot {
    fn new_iterator(&self) -> Box<dyn StoreIterator + '_> {
        Box::new(VecCursor {
            entries: &self.entries,
            pos: None,
        })
    }
}

struct VecCursor<'a> {
    entries: &'a [(Vec<u8>, Vec<u8>)],
    pos: Option<usize>,
}

impl<'a> StoreIterator for VecCursor<'a> {
    fn seek(&mut self, key: &[u8]) {
        self.pos = match self.entries.binary_search_by(|(k, _)| k.as_slice().cmp(key)) {
            Ok(i) | Err(i) => {
                if i < self.entries.len() {
                    Some(i)
                } else {
                    None
                }
            }
        };
    }

    fn first(&mut self) {
        self.pos = if self.entries.is_empty() { None } else { Some(0) };
    }

    fn last(&mut self) {
        self.pos = self.entries.len().checked_sub(1);
    }

    fn next(&mut self) {
        self.pos = match self.pos {
            Some(i) if i + 1 < self.entries.len() => Some(i + 1),
            _ => None,
        };
    }

    fn prev(&mut self) {
        self.pos = match self.pos {
            Some(i) if i > 0 => Some(i - 1),
            _ => None,
        };
    }

    fn valid(&self) -> bool {
        self.pos.is_some()
    }

    fn key(&self) -> Option<&[u8]> {
        self.pos.map(|i| self.entries[i].0.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.pos.map(|i| self.entries[i].1.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_of(pairs: &[(&[u8], &[u8])]) -> SledSnapshot {
        SledSnapshot {
            entries: pairs.iter().map(|(k, v)| (k.to_vec(), v.to_vec())).collect(),
        }
    }

    #[test]
    fn walks_in_order() {
        let snap = snapshot_of(&[(b"a", b"1"), (b"b", b"2"), (b"c", b"3")]);
        let mut it = snap.new_iterator();
        it.first();
        let mut seen = vec![];
        while it.valid() {
            seen.push(it.key().unwrap().to_vec());
            it.next();
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn seek_and_walk_backward() {
        let snap = snapshot_of(&[(b"a", b"1"), (b"c", b"3"), (b"e", b"5")]);
        let mut it = snap.new_iterator();
        it.seek(b"c");
        assert_eq!(it.key(), Some(&b"c"[..]));
        it.prev();
        assert_eq!(it.key(), Some(&b"a"[..]));
    }
}
