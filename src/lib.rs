//! filegate - access grants, pending uploads and expiry sweeping for
//! stored files.
//!
//! The [`grants::GrantStore`] is the core: it records finalized files,
//! capability access keys, use- and time-bounded download grants, and
//! upload tickets, and removes expired records on demand. Around it:
//!
//! - [`url`] - endpoint URL construction
//! - [`types`] - upload metadata, storage providers, record ids
//! - [`remote`] - R2 credentials from the environment
//! - [`config`] - `filegate.toml`
//! - [`http`] - the JSON API

pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod grants;
pub mod http;
pub mod paths;
pub mod remote;
pub mod types;
pub mod url;

pub use error::{Error, Result};
