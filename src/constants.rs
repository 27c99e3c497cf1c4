//! Default values shared by configuration and the CLI.

/// Default HTTP port for `filegate serve`.
pub const DEFAULT_PORT: u16 = 3940;

/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default path prefix for endpoint URLs.
pub const DEFAULT_PATH_PREFIX: &str = "/files";

/// Default lifetime of a pending upload ticket (1 hour).
pub const DEFAULT_PENDING_TTL_SECS: u64 = 3600;

/// Upper bound on a requested pending upload lifetime (7 days).
pub const MAX_PENDING_TTL_SECS: u64 = 7 * 24 * 3600;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "filegate.toml";

/// Grant database file name inside the data directory.
pub const DB_FILE: &str = "grants.redb";
