//! S3 types and response structures

use hyper::header::HeaderMap;
use hyper::StatusCode;
use std::collections::BTreeMap;

/// One page of a key listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Keys in server order
    pub keys: Vec<String>,
    /// Whether more keys exist beyond this page
    pub is_truncated: bool,
}

impl ListingPage {
    /// Create a new page
    pub fn new(keys: Vec<String>, is_truncated: bool) -> Self {
        Self { keys, is_truncated }
    }
}

/// Service error document (`<Error><Code>..</Code><Message>..</Message></Error>`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDocument {
    pub code: String,
    pub message: String,
}

/// Object metadata taken from response headers
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// HTTP status of the response
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    /// `x-amz-meta-*` headers, keyed by the name after the prefix
    pub metadata: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// Collect metadata from a response's status and headers
    pub fn from_headers(status: StatusCode, headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };

        let metadata = headers
            .iter()
            .filter_map(|(name, value)| {
                let meta_name = name.as_str().strip_prefix("x-amz-meta-")?;
                let value = value.to_str().ok()?;
                Some((meta_name.to_string(), value.to_string()))
            })
            .collect();

        Self {
            status: status.as_u16(),
            content_length: text("content-length").and_then(|v| v.parse().ok()),
            content_type: text("content-type"),
            etag: text("etag"),
            last_modified: text("last-modified"),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_object_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        headers.insert("etag", HeaderValue::from_static("\"abc\""));
        headers.insert("x-amz-meta-owner", HeaderValue::from_static("ops"));

        let info = ObjectInfo::from_headers(StatusCode::OK, &headers);
        assert_eq!(info.status, 200);
        assert_eq!(info.content_length, Some(42));
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
        assert_eq!(info.etag.as_deref(), Some("\"abc\""));
        assert_eq!(info.last_modified, None);
        assert_eq!(info.metadata.get("owner").map(String::as_str), Some("ops"));
    }
}
