use std::path::PathBuf;

/// Config structure for the store worker
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// The path to the database directory
    pub path: PathBuf,
    /// Change history to keep (indexed by block height)
    pub max_history_length: usize,
}
