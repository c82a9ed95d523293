/// Prefix stripped from author keys (`/authors/OL2A` -> `OL2A`)
pub const AUTHOR_KEY_PREFIX: &str = "/authors/";

/// Prefix stripped from work keys (`/works/OL1W` -> `OL1W`)
pub const WORK_KEY_PREFIX: &str = "/works/";

/// Name recorded for an author id that is not in the store
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// chrono equivalent of `yyyy-MM-dd'T'HH:mm:ss.SSSSSS`
pub const CREATED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Progress update interval (tick every N lines)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Bump when the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

/// Record failures kept per phase for the run summary; the rest are only counted
pub const MAX_REPORTED_FAILURES: usize = 100;

/// Read buffer for dump files
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

pub const DEFAULT_STORE_FILE: &str = "shelf.store";
