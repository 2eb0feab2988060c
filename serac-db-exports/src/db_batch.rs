use std::collections::BTreeMap;

/// Batch of changes to be written atomically.
/// A `None` value means the key is deleted.
pub type DBBatch = BTreeMap<Key, Option<Value>>;

/// Raw key type of the underlying store
pub type Key = Vec<u8>;
/// Raw value type of the underlying store
pub type Value = Vec<u8>;
