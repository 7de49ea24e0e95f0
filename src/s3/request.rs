//! Request assembly and signing
//!
//! Turns `(method, "bucket/key", query, headers)` into a fully signed request
//! description. The only side effect is reading the clock in [`RequestBuilder::build`].

use crate::s3::canonical::CanonicalRequest;
use crate::s3::error::{Result, S3Error};
use crate::s3::path::ObjectPath;
use crate::s3::signer::S3SignerV2;
use crate::s3::transport::Body;
use chrono::{DateTime, Utc};
use hyper::{Method, Request};
use std::collections::BTreeMap;

/// IMF-fixdate, e.g. `Tue, 27 Mar 2007 19:36:42 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Headers the builder always owns; caller-supplied values are replaced
const BUILDER_HEADERS: &[&str] = &["date", "host", "authorization"];

/// A request ready to be put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub host: String,
    pub port: u16,
    /// Encoded `/bucket/key`, plus the query if any
    pub path: String,
    pub method: Method,
    /// Caller headers merged with `Date`, `Host` and `Authorization`
    pub headers: BTreeMap<String, String>,
}

impl SignedRequest {
    /// Absolute URI; https only on 443
    pub fn uri(&self) -> String {
        match self.port {
            443 => format!("https://{}{}", self.host, self.path),
            80 => format!("http://{}{}", self.host, self.path),
            port => format!("http://{}:{}{}", self.host, port, self.path),
        }
    }

    /// Convert into an HTTP request carrying `body`.
    ///
    /// Header names or values that HTTP cannot carry fail with
    /// `InvalidRequest`.
    pub fn into_http(self, body: Body) -> Result<Request<Body>> {
        let mut req = Request::builder().method(self.method.clone()).uri(self.uri());
        for (key, value) in self.headers.iter() {
            req = req.header(key, value);
        }
        req.body(body)
            .map_err(|e| S3Error::InvalidRequest(e.to_string()))
    }
}

/// Builds signed requests against one endpoint with one set of credentials
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
    port: u16,
    signer: S3SignerV2,
}

impl RequestBuilder {
    pub fn new(endpoint: String, port: u16, signer: S3SignerV2) -> Self {
        Self {
            endpoint,
            port,
            signer,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn signer(&self) -> &S3SignerV2 {
        &self.signer
    }

    /// Build and sign a request dated now
    pub fn build(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &BTreeMap<String, String>,
    ) -> Result<SignedRequest> {
        self.build_at(method, path, query, headers, Utc::now())
    }

    /// Build and sign a request with an explicit `Date`
    ///
    /// `path` is taken whole as `bucket/key`, so a `?` in it belongs to the
    /// key. `query` must already be encoded. Fails with `InvalidPath` before
    /// doing anything else when `path` has no bucket separator.
    pub fn build_at(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &BTreeMap<String, String>,
        date: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        let object = ObjectPath::parse(path)?;

        let mut wire_path = object.resource_path();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            wire_path.push('?');
            wire_path.push_str(query);
        }

        let mut merged: BTreeMap<String, String> = headers
            .iter()
            .filter(|(k, _)| {
                !BUILDER_HEADERS
                    .iter()
                    .any(|owned| k.eq_ignore_ascii_case(owned))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        merged.insert("Date".to_string(), format_http_date(date));
        merged.insert("Host".to_string(), self.host_header());

        let canonical = CanonicalRequest::new(method.as_str(), &merged, &wire_path);
        merged.insert("Authorization".to_string(), self.signer.authorization(&canonical));

        tracing::debug!(method = %method, path = %wire_path, "Signed request");

        Ok(SignedRequest {
            host: self.endpoint.clone(),
            port: self.port,
            path: wire_path,
            method,
            headers: merged,
        })
    }

    fn host_header(&self) -> String {
        match self.port {
            80 | 443 => self.endpoint.clone(),
            port => format!("{}:{}", self.endpoint, port),
        }
    }
}

/// Format a timestamp the way HTTP `Date` headers expect
pub fn format_http_date(date: DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}
