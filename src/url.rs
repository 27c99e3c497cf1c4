//! Endpoint URL construction.
//!
//! [`build_endpoint_url`] joins a base URL, a path prefix and an endpoint
//! name with single slashes. It never fails: malformed inputs produce
//! malformed URLs. [`UrlBuilder`] binds the base and prefix from
//! configuration so handlers only supply the endpoint.

use crate::types::{GrantId, PendingUploadId};

/// Build an endpoint URL from `base_url`, `path_prefix` and `endpoint`.
///
/// - exactly one trailing `/` is removed from `base_url` (`"a//"` keeps one)
/// - `path_prefix` is trimmed, gets exactly one leading `/` and loses one
///   trailing `/`
/// - exactly one leading `/` is removed from `endpoint`
///
/// ```
/// use filegate::url::build_endpoint_url;
///
/// assert_eq!(
///     build_endpoint_url("https://x.com/", "files", "/get"),
///     "https://x.com/files/get"
/// );
/// assert_eq!(
///     build_endpoint_url("https://x.com", "/files/", "get"),
///     "https://x.com/files/get"
/// );
/// ```
pub fn build_endpoint_url(base_url: &str, path_prefix: &str, endpoint: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);

    let prefix = format!("/{}", path_prefix.trim().trim_start_matches('/'));
    let prefix = prefix.strip_suffix('/').unwrap_or(&prefix);

    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);

    format!("{base}{prefix}/{endpoint}")
}

/// URL builder bound to a configured base URL and path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base_url: String,
    path_prefix: String,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path_prefix: path_prefix.into(),
        }
    }

    /// URL for a named endpoint under the configured prefix.
    pub fn endpoint(&self, endpoint: &str) -> String {
        build_endpoint_url(&self.base_url, &self.path_prefix, endpoint)
    }

    /// Retrieval URL for a download grant.
    pub fn download_url(&self, grant: &GrantId) -> String {
        format!("{}?grant={grant}", self.endpoint("download"))
    }

    /// Upload URL for a pending upload ticket.
    pub fn upload_url(&self, pending: &PendingUploadId) -> String {
        format!("{}?ticket={pending}", self.endpoint("upload"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_base_and_leading_slash_endpoint() {
        assert_eq!(
            build_endpoint_url("https://x.com/", "files", "/get"),
            "https://x.com/files/get"
        );
    }

    #[test]
    fn test_slashed_prefix() {
        assert_eq!(
            build_endpoint_url("https://x.com", "/files/", "get"),
            "https://x.com/files/get"
        );
    }

    #[test]
    fn test_prefix_is_trimmed() {
        assert_eq!(
            build_endpoint_url("https://x.com", "  files  ", "get"),
            "https://x.com/files/get"
        );
    }

    #[test]
    fn test_empty_prefix() {
        assert_eq!(
            build_endpoint_url("https://x.com", "", "get"),
            "https://x.com/get"
        );
    }

    #[test]
    fn test_only_one_trailing_slash_removed() {
        // Not a normalizer: the second slash survives.
        assert_eq!(
            build_endpoint_url("https://x.com//", "files", "get"),
            "https://x.com//files/get"
        );
        assert_eq!(
            build_endpoint_url("https://x.com", "files", "//get"),
            "https://x.com/files//get"
        );
    }

    #[test]
    fn test_nested_prefix() {
        assert_eq!(
            build_endpoint_url("http://localhost:3940", "api/v1/storage/", "download"),
            "http://localhost:3940/api/v1/storage/download"
        );
    }

    #[test]
    fn test_builder_urls() {
        let urls = UrlBuilder::new("https://cdn.example.com/", "/files");
        assert_eq!(urls.endpoint("get"), "https://cdn.example.com/files/get");

        let grant = GrantId::new();
        assert_eq!(
            urls.download_url(&grant),
            format!("https://cdn.example.com/files/download?grant={grant}")
        );

        let ticket = PendingUploadId::new();
        assert_eq!(
            urls.upload_url(&ticket),
            format!("https://cdn.example.com/files/upload?ticket={ticket}")
        );
    }
}
