//! HTTP transport boundary
//!
//! The client only needs "send this request, give me the response". Keeping
//! that behind a trait lets tests script responses without a network.

use crate::s3::error::{Result, S3Error};
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{Request, Response};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use std::future::Future;
use std::time::Duration;

/// Request and response body type used across the client
pub type Body = UnsyncBoxBody<Bytes, S3Error>;

/// Wrap an in-memory buffer as a body
pub fn full_body(data: impl Into<Bytes>) -> Body {
    Full::new(data.into()).map_err(|never| match never {}).boxed_unsync()
}

/// An empty body
pub fn empty_body() -> Body {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}

/// Sends one HTTP request and yields its response.
///
/// Implementations must not retry; every call is exactly one round trip
/// whose outcome is reported once.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Body>) -> impl Future<Output = Result<Response<Body>>> + Send;
}

/// hyper-based transport with a shared connection pool
///
/// Clone is cheap - the underlying HTTP client uses Arc internally.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    /// Create a transport with TCP_NODELAY and keepalive enabled
    pub fn new() -> Self {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(10)));
        http.set_keepalive(Some(Duration::from_secs(90)));

        let https = HttpsConnector::new_with_connector(http);

        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .set_host(false)
            .build(https);

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let response = self.client.request(request).await?;
        Ok(response.map(|incoming| incoming.map_err(S3Error::from).boxed_unsync()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_body_collects() {
        let body = full_body("hello");
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_empty_body_collects() {
        let bytes = empty_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_transport_is_clone() {
        let transport = HyperTransport::new();
        let _clone = transport.clone();
    }
}
