//! Print an endpoint URL.

use crate::url::build_endpoint_url;

/// Print the URL for `endpoint` under `base_url` and `path_prefix`.
pub fn execute(base_url: &str, path_prefix: &str, endpoint: &str) {
    println!("{}", build_endpoint_url(base_url, path_prefix, endpoint));
}
