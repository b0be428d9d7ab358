//! # Unit of Work
//!
//! Buffers every write of one block on top of the store. Reads see the
//! buffered writes. `commit` flushes them as one atomic batch; dropping the
//! unit of work discards them.

use std::collections::BTreeMap;

use tracing::trace;

use crate::domain::{keys, StoreError};
use crate::ports::{BatchOperation, KeyValueStore};
use crate::tables::{KvRead, KvWrite};

pub struct UnitOfWork<'a> {
    store: &'a dyn KeyValueStore,
    /// `None` marks a pending delete.
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> UnitOfWork<'a> {
    pub fn begin(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            overlay: BTreeMap::new(),
        }
    }

    /// Number of buffered key changes.
    pub fn pending(&self) -> usize {
        self.overlay.len()
    }

    /// Flush all buffered changes atomically. Returns the number of operations.
    pub fn commit(self) -> Result<usize, StoreError> {
        let ops: Vec<BatchOperation> = self
            .overlay
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::put(key, value),
                None => BatchOperation::delete(key),
            })
            .collect();
        let count = ops.len();
        if count > 0 {
            self.store.atomic_batch_write(ops)?;
        }
        trace!(operations = count, "Unit of work committed");
        Ok(count)
    }

    /// Discard all buffered changes.
    pub fn abort(self) {
        trace!(discarded = self.overlay.len(), "Unit of work aborted");
    }

    fn merged_scan(&self, prefix: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.store.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .overlay
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged)
    }
}

impl KvRead for UnitOfWork<'_> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.overlay.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.store.get(key),
        }
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self.merged_scan(prefix)?.into_iter().collect())
    }

    fn last_entry_below(
        &self,
        prefix: &[u8],
        upper: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
        let end = keys::prefix_end(prefix);
        let mut bound = std::cmp::min(upper, end.as_slice()).to_vec();
        loop {
            if bound.as_slice() <= prefix {
                return Ok(None);
            }
            let stored = self.store.last_below(prefix, &bound)?;
            let buffered = self
                .overlay
                .range(prefix.to_vec()..bound.clone())
                .next_back();

            let Some((key, value)) = buffered else {
                return Ok(stored);
            };
            if matches!(&stored, Some((stored_key, _)) if stored_key > key) {
                return Ok(stored);
            }
            match value {
                Some(v) => return Ok(Some((key.clone(), v.clone()))),
                // Deleted in this unit of work; seek below it.
                None => bound = key.clone(),
            }
        }
    }
}

impl KvWrite for UnitOfWork<'_> {
    fn write(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.overlay.insert(key, Some(value));
        Ok(())
    }

    fn remove(&mut self, key: Vec<u8>) -> Result<(), StoreError> {
        self.overlay.insert(key, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InMemoryKVStore;

    #[test]
    fn test_reads_see_buffered_writes() {
        let store = InMemoryKVStore::new();
        store.put(b"k/1", b"old").unwrap();

        let mut uow = UnitOfWork::begin(&store);
        uow.write(b"k/1".to_vec(), b"new".to_vec()).unwrap();
        uow.write(b"k/2".to_vec(), b"two".to_vec()).unwrap();

        assert_eq!(uow.read(b"k/1").unwrap(), Some(b"new".to_vec()));
        assert_eq!(uow.scan(b"k/").unwrap().len(), 2);
        // Store untouched until commit.
        assert_eq!(store.get(b"k/1").unwrap(), Some(b"old".to_vec()));
    }

    #[test]
    fn test_buffered_delete_hides_store_entry() {
        let store = InMemoryKVStore::new();
        store.put(b"c/10", b"a").unwrap();
        store.put(b"c/50", b"b").unwrap();

        let mut uow = UnitOfWork::begin(&store);
        uow.remove(b"c/10".to_vec()).unwrap();

        assert_eq!(uow.read(b"c/10").unwrap(), None);
        assert_eq!(uow.last_entry_below(b"c/", b"c/49").unwrap(), None);
        assert_eq!(
            uow.last_entry_below(b"c/", b"c/99").unwrap(),
            Some((b"c/50".to_vec(), b"b".to_vec()))
        );
    }

    #[test]
    fn test_last_entry_below_seeks_without_scanning() {
        struct SeekOnly(InMemoryKVStore);

        impl KeyValueStore for SeekOnly {
            fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
                self.0.get(key)
            }
            fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
                self.0.put(key, value)
            }
            fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
                self.0.delete(key)
            }
            fn atomic_batch_write(&self, ops: Vec<BatchOperation>) -> Result<(), StoreError> {
                self.0.atomic_batch_write(ops)
            }
            fn prefix_scan(&self, _: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
                panic!("history lookups must seek, not scan");
            }
            fn last_below(
                &self,
                prefix: &[u8],
                upper: &[u8],
            ) -> Result<Option<(Vec<u8>, Vec<u8>)>, StoreError> {
                self.0.last_below(prefix, upper)
            }
        }

        let store = SeekOnly(InMemoryKVStore::new());
        let seeded: [(&[u8], &[u8]); 4] =
            [(b"c/10", b"a"), (b"c/30", b"b"), (b"c/50", b"c"), (b"d/00", b"x")];
        for (key, value) in seeded {
            store.put(key, value).unwrap();
        }

        let mut uow = UnitOfWork::begin(&store);
        uow.write(b"c/20".to_vec(), b"buffered".to_vec()).unwrap();
        uow.remove(b"c/30".to_vec()).unwrap();
        uow.remove(b"c/50".to_vec()).unwrap();
        uow.write(b"b/99".to_vec(), b"other".to_vec()).unwrap();

        // Stored entry newer than anything buffered in range.
        assert_eq!(
            uow.last_entry_below(b"c/", b"c/15").unwrap(),
            Some((b"c/10".to_vec(), b"a".to_vec()))
        );
        // Deletes are skipped down to the buffered write.
        assert_eq!(
            uow.last_entry_below(b"c/", b"c/99").unwrap(),
            Some((b"c/20".to_vec(), b"buffered".to_vec()))
        );
        assert_eq!(uow.last_entry_below(b"c/", b"c/10").unwrap(), None);
        assert_eq!(uow.last_entry_below(b"a/", b"a/99").unwrap(), None);
    }

    #[test]
    fn test_commit_applies_everything() {
        let store = InMemoryKVStore::new();
        store.put(b"gone", b"x").unwrap();

        let mut uow = UnitOfWork::begin(&store);
        uow.write(b"a".to_vec(), b"1".to_vec()).unwrap();
        uow.remove(b"gone".to_vec()).unwrap();
        assert_eq!(uow.pending(), 2);
        assert_eq!(uow.commit().unwrap(), 2);

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!store.exists(b"gone").unwrap());
    }

    #[test]
    fn test_abort_discards_everything() {
        let store = InMemoryKVStore::new();
        let before = store.snapshot();

        let mut uow = UnitOfWork::begin(&store);
        uow.write(b"a".to_vec(), b"1".to_vec()).unwrap();
        uow.abort();

        assert_eq!(store.snapshot(), before);
    }
}
