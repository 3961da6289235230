// Lifecycle constants (no magic values in adapters or handlers)
use std::time::Duration;

/// Upper bound for one badge download (30s)
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for one badge body (10 MiB)
pub const DEFAULT_FETCH_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Hard timeout for a print submission (45s)
pub const DEFAULT_PRINT_TIMEOUT: Duration = Duration::from_secs(45);

/// Timeout for health/list/status/queue queries (15s)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Grace delay before a printed temp document is deleted (5s)
/// Lets the spooler finish reading the file after `lp` returns.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(5);

/// Path under the upstream API base URL that serves badge PDFs
pub const BADGE_API_PATH: &str = "app/totem/badge";

/// Highest copy count accepted for one submission
pub const MAX_COPIES: u32 = 99;
