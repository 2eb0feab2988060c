use crate::{
    DBBatch, DbController, DbDirection, DbError, DbIteratorMode, Key, ShareableDbController,
    Value, DIFFS_CF, METADATA_CF, STATE_CF,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory [`DbController`] with the same iteration semantics as the
/// production store. Iterators yield a snapshot of the column taken at
/// creation time.
#[derive(Debug, Default)]
pub struct MemoryDb {
    columns: BTreeMap<String, BTreeMap<Key, Value>>,
    change_height: Option<u64>,
}

impl MemoryDb {
    /// Creates an empty `MemoryDb` with the standard column families
    pub fn new() -> Self {
        let mut columns = BTreeMap::new();
        for handle_cf in [METADATA_CF, STATE_CF, DIFFS_CF] {
            columns.insert(handle_cf.to_string(), BTreeMap::new());
        }
        Self {
            columns,
            change_height: None,
        }
    }

    /// Creates an empty `MemoryDb` behind a shareable handle
    pub fn new_shareable() -> ShareableDbController {
        Arc::new(RwLock::new(
            Box::new(Self::new()) as Box<dyn DbController>
        ))
    }

    /// Height attached to the last written batch
    pub fn change_height(&self) -> Option<u64> {
        self.change_height
    }

    fn apply_batch(&mut self, handle_cf: &str, batch: DBBatch) {
        let column = self.columns.entry(handle_cf.to_string()).or_default();
        for (key, value) in batch {
            match value {
                Some(value) => {
                    column.insert(key, value);
                }
                None => {
                    column.remove(&key);
                }
            }
        }
    }

    fn snapshot(&self, handle_cf: &str) -> Vec<(Key, Value)> {
        self.columns
            .get(handle_cf)
            .map(|column| column.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl DbController for MemoryDb {
    fn write_batch(&mut self, batch: DBBatch, diffs_batch: DBBatch, change_height: Option<u64>) {
        self.apply_batch(STATE_CF, batch);
        self.apply_batch(DIFFS_CF, diffs_batch);
        if change_height.is_some() {
            self.change_height = change_height;
        }
    }

    fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Vec<u8>, value: &[u8]) {
        batch.insert(key, Some(value.to_vec()));
    }

    fn delete_key(&self, batch: &mut DBBatch, key: Vec<u8>) {
        batch.insert(key, None);
    }

    fn delete_prefix(&mut self, handle_cf: &str, prefix: &[u8]) {
        if let Some(column) = self.columns.get_mut(handle_cf) {
            column.retain(|key, _| !key.starts_with(prefix));
        }
    }

    fn reset(&mut self) {
        for column in self.columns.values_mut() {
            column.clear();
        }
        self.change_height = None;
    }

    fn get_cf(&self, handle_cf: &str, key: Key) -> Result<Option<Value>, DbError> {
        let column = self
            .columns
            .get(handle_cf)
            .ok_or_else(|| DbError::UnknownColumnFamily(handle_cf.to_string()))?;
        Ok(column.get(&key).cloned())
    }

    fn iterator_cf(
        &self,
        handle_cf: &str,
        mode: DbIteratorMode,
    ) -> Box<dyn Iterator<Item = (Key, Value)> + '_> {
        let mut entries = self.snapshot(handle_cf);
        match mode {
            DbIteratorMode::Start => {}
            DbIteratorMode::End => entries.reverse(),
            DbIteratorMode::From(key, DbDirection::Forward) => {
                entries.retain(|(k, _)| k.as_slice() >= key);
            }
            DbIteratorMode::From(key, DbDirection::Reverse) => {
                entries.retain(|(k, _)| k.as_slice() <= key);
                entries.reverse();
            }
        }
        Box::new(entries.into_iter())
    }

    fn prefix_iterator_cf(
        &self,
        handle_cf: &str,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (Key, Value)> + '_> {
        let mut entries = self.snapshot(handle_cf);
        entries.retain(|(k, _)| k.as_slice() >= prefix);
        Box::new(entries.into_iter())
    }
}
