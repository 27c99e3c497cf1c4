//! Path utilities for filegate data.
//!
//! - [`get_filegate_dir`] - `~/.filegate/` (base directory)
//! - [`get_db_path`] - `~/.filegate/grants.redb` (grant database)

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::constants;

/// Get the filegate base directory.
///
/// Resolution order:
/// 1. `FILEGATE_HOME` environment variable (if set)
/// 2. `~/.filegate/` (default)
pub fn get_filegate_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("FILEGATE_HOME")
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".filegate"))
}

/// Get the default grant database path: `~/.filegate/grants.redb`
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_filegate_dir()?.join(constants::DB_FILE))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(rest))
        },
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_filegate_home_override() {
        // SAFETY: serialized with other env-mutating tests.
        unsafe {
            std::env::set_var("FILEGATE_HOME", "/tmp/filegate-test");
        }
        assert_eq!(
            get_filegate_dir().unwrap(),
            PathBuf::from("/tmp/filegate-test")
        );
        assert_eq!(
            get_db_path().unwrap(),
            PathBuf::from("/tmp/filegate-test/grants.redb")
        );
        unsafe {
            std::env::remove_var("FILEGATE_HOME");
        }
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(
            expand_home("/var/lib/filegate/db.redb").unwrap(),
            PathBuf::from("/var/lib/filegate/db.redb")
        );
        assert_eq!(expand_home("data.redb").unwrap(), PathBuf::from("data.redb"));
    }
}
