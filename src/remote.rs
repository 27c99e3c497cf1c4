//! External object store (R2) configuration.
//!
//! Credentials come from four environment variables that must all be
//! present and non-empty. Anything less yields `None`, and callers fall
//! back to the primary blob store. The loaded config is passed explicitly
//! to whoever needs it; nothing below `main` reads the environment.

use std::fmt;

/// Cloudflare account id.
pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
/// S3-compatible access key id.
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
/// S3-compatible secret access key.
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
/// Target bucket.
pub const ENV_BUCKET_NAME: &str = "R2_BUCKET_NAME";

/// Credentials for an R2-compatible object store.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
}

impl R2Config {
    /// Load the config from the process environment.
    ///
    /// Returns `None` when any of the four variables is missing or empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the config through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Some(Self {
            account_id: read(ENV_ACCOUNT_ID)?,
            access_key_id: read(ENV_ACCESS_KEY_ID)?,
            secret_access_key: read(ENV_SECRET_ACCESS_KEY)?,
            bucket_name: read(ENV_BUCKET_NAME)?,
        })
    }

    /// S3 API endpoint for the account.
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

impl fmt::Debug for R2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    const ALL_KEYS: [&str; 4] = [
        ENV_ACCOUNT_ID,
        ENV_ACCESS_KEY_ID,
        ENV_SECRET_ACCESS_KEY,
        ENV_BUCKET_NAME,
    ];

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_ACCOUNT_ID, "acct123".to_string()),
            (ENV_ACCESS_KEY_ID, "AKIA".to_string()),
            (ENV_SECRET_ACCESS_KEY, "s3cr3t".to_string()),
            (ENV_BUCKET_NAME, "uploads".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Option<R2Config> {
        R2Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_all_present() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.account_id, "acct123");
        assert_eq!(config.access_key_id, "AKIA");
        assert_eq!(config.secret_access_key, "s3cr3t");
        assert_eq!(config.bucket_name, "uploads");
        assert_eq!(
            config.endpoint(),
            "https://acct123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_any_missing_is_unconfigured() {
        for key in ALL_KEYS {
            let mut env = full_env();
            env.remove(key);
            assert!(load(&env).is_none(), "expected None without {key}");
        }
    }

    #[test]
    fn test_empty_value_is_unconfigured() {
        for key in ALL_KEYS {
            let mut env = full_env();
            env.insert(key, "   ".to_string());
            assert!(load(&env).is_none(), "expected None with blank {key}");
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&full_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_from_process_env() {
        // SAFETY: serialized with other env-mutating tests.
        unsafe {
            for (key, value) in full_env() {
                std::env::set_var(key, value);
            }
        }
        assert!(R2Config::from_env().is_some());

        unsafe {
            std::env::remove_var(ENV_BUCKET_NAME);
        }
        assert!(R2Config::from_env().is_none());

        unsafe {
            for key in ALL_KEYS {
                std::env::remove_var(key);
            }
        }
    }
}
