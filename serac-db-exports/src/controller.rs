use crate::{DBBatch, DbError, Key, Value};
use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle to the store controller
pub type ShareableDbController = Arc<RwLock<Box<dyn DbController>>>;

pub trait DbController: Send + Sync + Debug {
    /// Writes the state batch and the diffs batch to the DB atomically,
    /// attached to the given block height
    fn write_batch(&mut self, batch: DBBatch, diffs_batch: DBBatch, change_height: Option<u64>);

    /// Utility function to put / update a key & value in the batch
    fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Vec<u8>, value: &[u8]);

    /// Utility function to delete a key & value in the batch
    fn delete_key(&self, batch: &mut DBBatch, key: Vec<u8>);

    /// Utility function to delete all keys under a prefix
    fn delete_prefix(&mut self, handle_cf: &str, prefix: &[u8]);

    /// Reset the database content
    fn reset(&mut self);

    /// Exposes the backend's point lookup
    fn get_cf(&self, handle_cf: &str, key: Key) -> Result<Option<Value>, DbError>;

    /// Exposes the backend's ordered iteration
    fn iterator_cf(
        &self,
        handle_cf: &str,
        mode: DbIteratorMode,
    ) -> Box<dyn Iterator<Item = (Key, Value)> + '_>;

    /// Exposes the backend's prefix iteration
    fn prefix_iterator_cf(
        &self,
        handle_cf: &str,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (Key, Value)> + '_>;
}

pub enum DbIteratorMode<'a> {
    Start,
    End,
    From(&'a [u8], DbDirection),
}

pub enum DbDirection {
    Forward,
    Reverse,
}
