//! Canonical request construction for S3 header authentication
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                CanonicalizedAmzHeaders +
//!                CanonicalizedResource
//! ```
//!
//! Everything here is a pure function of its inputs. Caller headers are only
//! read, never modified.

use std::collections::BTreeMap;
use std::fmt;

/// Prefix of the headers that take part in signing (matched case-insensitively)
pub const AMZ_HEADER_PREFIX: &str = "x-amz-";

/// Query parameters that select a sub-resource and therefore stay in the
/// canonical resource. Everything else in the query string is dropped.
pub const SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// The signable view of one request. Built per request and dropped after signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub verb: String,
    pub content_md5: String,
    pub content_type: String,
    pub date: String,
    pub canonicalized_amz_headers: String,
    pub canonicalized_resource: String,
}

impl CanonicalRequest {
    /// Derive the canonical form from a verb, the request headers and the
    /// request path (query included).
    ///
    /// `Content-MD5`, `Content-Type` and `Date` are looked up
    /// case-insensitively; when absent they contribute an empty line.
    pub fn new(verb: &str, headers: &BTreeMap<String, String>, path: &str) -> Self {
        Self {
            verb: verb.to_string(),
            content_md5: header_value(headers, "content-md5").to_string(),
            content_type: header_value(headers, "content-type").to_string(),
            date: header_value(headers, "date").to_string(),
            canonicalized_amz_headers: canonicalize_amz_headers(headers),
            canonicalized_resource: canonicalize_resource(path),
        }
    }

    /// The exact string the service expects to be signed
    pub fn string_to_sign(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}\n{}\n{}\n{}{}",
            self.verb,
            self.content_md5,
            self.content_type,
            self.date,
            self.canonicalized_amz_headers,
            self.canonicalized_resource
        )
    }
}

/// Build the CanonicalizedAmzHeaders string.
///
/// `x-amz-*` names are lowercased and sorted; each value is trimmed with inner
/// whitespace runs collapsed to one space. Values of repeated names are joined
/// with a comma. One `name:value\n` line per distinct name.
pub fn canonicalize_amz_headers(headers: &BTreeMap<String, String>) -> String {
    let mut amz_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in headers {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with(AMZ_HEADER_PREFIX) {
            amz_headers
                .entry(lower)
                .or_default()
                .push(collapse_whitespace(value));
        }
    }

    let mut result = String::with_capacity(amz_headers.len() * 48);
    for (name, values) in &amz_headers {
        result.push_str(name);
        result.push(':');
        result.push_str(&values.join(","));
        result.push('\n');
    }
    result
}

/// Build the CanonicalizedResource string: the path plus any sub-resource
/// parameters, sorted by name. Other query parameters are dropped.
pub fn canonicalize_resource(path_and_query: &str) -> String {
    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_and_query, ""),
    };

    let mut sub_params: Vec<(&str, Option<String>)> = Vec::new();
    for param in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match param.split_once('=') {
            Some((k, v)) => {
                let decoded = urlencoding::decode(v)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| v.to_string());
                (k, if decoded.is_empty() { None } else { Some(decoded) })
            }
            None => (param, None),
        };
        if SUB_RESOURCES.contains(&key) {
            sub_params.push((key, value));
        }
    }

    if sub_params.is_empty() {
        return path.to_string();
    }

    sub_params.sort_by(|a, b| a.0.cmp(b.0));

    let params: Vec<String> = sub_params
        .iter()
        .map(|(k, v)| match v {
            Some(val) => format!("{}={}", k, val),
            None => (*k).to_string(),
        })
        .collect();
    format!("{}?{}", path, params.join("&"))
}

/// Case-insensitive header lookup; missing headers read as ""
pub fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> &'a str {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .unwrap_or("")
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_string_to_sign_with_empty_content_lines() {
        let h = headers(&[("Date", "Tue, 27 Mar 2007 19:36:42 +0000")]);
        let canonical = CanonicalRequest::new("GET", &h, "/johnsmith/photos/puppy.jpg");
        assert_eq!(
            canonical.string_to_sign(),
            "GET\n\n\nTue, 27 Mar 2007 19:36:42 +0000\n/johnsmith/photos/puppy.jpg"
        );
    }

    #[test]
    fn test_content_headers_matched_case_insensitively() {
        let h = headers(&[
            ("content-type", "image/jpeg"),
            ("CONTENT-MD5", "4gJE4saaMU4BqNR0kLY+lw=="),
            ("date", "Tue, 27 Mar 2007 21:15:45 +0000"),
        ]);
        let canonical = CanonicalRequest::new("PUT", &h, "/johnsmith/photos/puppy.jpg");
        assert_eq!(canonical.content_type, "image/jpeg");
        assert_eq!(canonical.content_md5, "4gJE4saaMU4BqNR0kLY+lw==");
    }

    #[test]
    fn test_amz_headers_sorted_lowercased_and_collapsed() {
        let h = headers(&[
            ("X-Amz-Meta-ReviewedBy", "  joe@example.com  "),
            ("x-amz-acl", "public-read"),
            ("X-Amz-Meta-Note", "two   spaced\twords"),
            ("Content-Type", "text/plain"),
            ("Host", "s3.amazonaws.com"),
        ]);
        assert_eq!(
            canonicalize_amz_headers(&h),
            "x-amz-acl:public-read\n\
             x-amz-meta-note:two spaced words\n\
             x-amz-meta-reviewedby:joe@example.com\n"
        );
    }

    #[test]
    fn test_duplicate_amz_header_values_joined() {
        let h = headers(&[
            ("X-Amz-Meta-Tag", "alpha"),
            ("x-amz-meta-tag", "beta"),
        ]);
        assert_eq!(canonicalize_amz_headers(&h), "x-amz-meta-tag:alpha,beta\n");
    }

    #[test]
    fn test_no_amz_headers() {
        let h = headers(&[("Content-Length", "10"), ("Expect", "100-continue")]);
        assert_eq!(canonicalize_amz_headers(&h), "");
    }

    #[test]
    fn test_resource_drops_plain_query_params() {
        assert_eq!(
            canonicalize_resource("/bucket/?prefix=logs%2F&marker=logs%2F9"),
            "/bucket/"
        );
        assert_eq!(canonicalize_resource("/bucket/key"), "/bucket/key");
    }

    #[test]
    fn test_resource_keeps_sorted_sub_resources() {
        assert_eq!(
            canonicalize_resource("/bucket/key?versionId=3&prefix=x&acl"),
            "/bucket/key?acl&versionId=3"
        );
        assert_eq!(
            canonicalize_resource("/bucket/key?response-content-type=text%2Fplain"),
            "/bucket/key?response-content-type=text/plain"
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = BTreeMap::new();
        a.insert("x-amz-meta-b".to_string(), "2".to_string());
        a.insert("x-amz-meta-a".to_string(), "1".to_string());
        let mut b = BTreeMap::new();
        b.insert("x-amz-meta-a".to_string(), "1".to_string());
        b.insert("x-amz-meta-b".to_string(), "2".to_string());
        assert_eq!(
            CanonicalRequest::new("PUT", &a, "/b/k"),
            CanonicalRequest::new("PUT", &b, "/b/k")
        );
    }
}
