// -
// Database namespaces

/// Sled database tree namespaces
pub(crate) const TIMER_RECORDS_TREE: &str = "_timer_records";

/// Sub directory of `db_root_dir` holding the sled database
pub(crate) const TIMER_DB_DIR: &str = "timers";

// -
// Record codec

/// Bumped whenever the persisted envelope changes shape
pub(crate) const RECORD_SCHEMA_VERSION: u8 = 1;

/// Separator between owner id and kind in keys and notification ids
pub const KEY_SEPARATOR: char = ':';

// -
// Notification budget

/// Pending-notification ceiling of the source platform
pub(crate) const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

// -
// Configuration

/// Prefix of environment variable overrides, e.g. `WASHDAY__BUDGET__CAPACITY`
pub(crate) const CONFIG_ENV_PREFIX: &str = "WASHDAY";
