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

use redikv_store::StoreIterator;
use redikv_types::Error;

/// A bidirectional cursor over a live `sled::Tree`, built on `get_gt`/
/// `get_lt` rather than a single forward-only `sled::Iter`, since the
/// range scans need to walk either direction from an arbitrary seek point.
pub struct SledCursor {
    tree: sled::Tree,
    current: Option<(Vec<u8>, Vec<u8>)>,
    error: Option<Error>,
}

impl SledCursor {
    pub fn new(tree: sled::Tree) -> Self {
        Self {
            tree,
            current: None,
            error: None,
        }
    }

    fn record<T>(&mut self, res: sled::Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(e) => {
                self.error = Some(e.into());
                None
            }
        }
    }
}

impl StoreIterator for SledCursor {
    fn seek(&mut self, key: &[u8]) {
        let res = self.tree.range(key.to_vec()..).next().transpose();
        let pair = self.record(res).flatten();
        self.current = pair.map(|(k, v)| (k.to_vec(), v.to_vec()));
    }

    fn first(&mut self) {
        let res = self.tree.iter().next().transpose();
        let pair = self.record(res).flatten();
        self.current = pair.map(|(k, v)| (k.to_vec(), v.to_vec()));
    }

    fn last(&mut self) {
        let res = self.tree.iter().next_back().transpose();
        let pair = self.record(res).flatten();
        self.current = pair.map(|(k, v)| (k.to_vec(), v.to_vec()));
    }

    fn next(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let res = self.tree.get_gt(key);
        let pair = self.record(res).flatten();
        self.current = pair.map(|(k, v)| (k.to_vec(), v.to_vec()));
    }

    fn prev(&mut self) {
        let Some((key, _)) = self.current.take() else {
            return;
        };
        let res = self.tree.get_lt(key);
        let pair = self.record(res).flatten();
        self.current = pair.map(|(k, v)| (k.to_vec(), v.to_vec()));
    }

    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(k, _)| k.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, v)| v.as_slice())
    }

    fn error(&self) -> Option<Error> {
        match &self.error {
            Some(Error::Store(msg)) => Some(Error::Store(msg.clone())),
            Some(Error::Corrupt(msg)) => Some(Error::Corrupt(msg.clone())),
            Some(_) | None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tree() -> sled::Tree {
        let db = sled::Config::new().temporary(true).open().unwrap();
        db.open_tree("t").unwrap()
    }

    #[test]
    fn forward_and_backward_walk() {
        let tree = open_tree();
        for k in [b"a", b"b", b"c"] {
            tree.insert(k, b"v").unwrap();
        }
        let mut c = SledCursor::new(tree);
        c.first();
        assert_eq!(c.key(), Some(&b"a"[..]));
        c.next();
        assert_eq!(c.key(), Some(&b"b"[..]));
        c.next();
        assert_eq!(c.key(), Some(&b"c"[..]));
        c.next();
        assert!(!c.valid());

        c.last();
        assert_eq!(c.key(), Some(&b"c"[..]));
        c.prev();
        assert_eq!(c.key(), Some(&b"b"[..]));
    }

    #[test]
    fn seek_lands_on_first_ge() {
        let tree = open_tree();
        tree.insert(b"a", b"1").unwrap();
        tree.insert(b"c", b"3").unwrap();
        let mut c = SledCursor::new(tree);
        c.seek(b"b");
        assert_eq!(c.key(), Some(&b"c"[..]));
    }
}
