// Column families
pub const METADATA_CF: &str = "metadata";
pub const STATE_CF: &str = "state";
pub const DIFFS_CF: &str = "validator_diffs";

// Change height
pub const CHANGE_HEIGHT_KEY: &[u8; 1] = b"c";
pub const CHANGE_HEIGHT_DESER_ERROR: &str = "critical: change_height deserialization failed";

// Errors
pub const CF_ERROR: &str = "critical: database column family operation failed";
pub const OPEN_ERROR: &str = "critical: database open operation failed";
pub const CRUD_ERROR: &str = "critical: database crud operation failed";

// Staker ledger
pub const STAKER_SER_ERROR: &str = "critical: staker record serialization failed";
pub const STAKER_DESER_ERROR: &str = "critical: staker record deserialization failed";
pub const DIFF_KEY_DESER_ERROR: &str = "critical: weight diff key deserialization failed";
pub const DIFF_VALUE_DESER_ERROR: &str = "critical: weight diff value deserialization failed";
