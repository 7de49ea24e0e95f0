//! S3 client implementation with core operations
//!
//! Every operation takes a `bucket/key` path, signs one request through the
//! [`RequestBuilder`], sends it through a [`Transport`] and resolves to
//! exactly one result. Nothing here retries; that is left to the caller.

use crate::config::ClientConfig;
use crate::s3::error::{Result, S3Error};
use crate::s3::paginate::{self, PageSource};
use crate::s3::path::{encode_query_value_into, ObjectPath};
use crate::s3::request::RequestBuilder;
use crate::s3::signer::S3SignerV2;
use crate::s3::transport::{empty_body, full_body, Body, HyperTransport, Transport};
use crate::s3::types::{ListingPage, ObjectInfo};
use crate::s3::xml;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use http_body_util::{BodyExt, BodyStream, StreamBody};
use hyper::body::Frame;
use hyper::header::HeaderMap;
use hyper::{Method, Response, StatusCode};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// S3 client
///
/// Credentials and endpoint are fixed at construction and only read
/// afterwards, so a client can be shared freely between tasks.
/// Clone is cheap when the transport is.
#[derive(Clone)]
pub struct S3Client<T = HyperTransport> {
    transport: T,
    builder: RequestBuilder,
}

impl S3Client<HyperTransport> {
    /// Create a client using the hyper transport.
    ///
    /// Fails immediately with `S3Error::Config` when the key or secret is missing.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_transport(config, HyperTransport::new())
    }
}

impl<T: Transport> S3Client<T> {
    /// Create a client sending through `transport`
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;

        let signer = S3SignerV2::new(config.key.clone(), config.secret.clone());
        let builder = RequestBuilder::new(config.endpoint.clone(), config.port, signer);

        Ok(Self { transport, builder })
    }

    pub fn endpoint(&self) -> &str {
        self.builder.endpoint()
    }

    pub fn port(&self) -> u16 {
        self.builder.port()
    }

    /// Sign and send one request; the response is returned whatever its status
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: &BTreeMap<String, String>,
        body: Body,
    ) -> Result<Response<Body>> {
        self.send(method, path, None, headers, body).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &BTreeMap<String, String>,
        body: Body,
    ) -> Result<Response<Body>> {
        let signed = self.builder.build(method, path, query, headers)?;
        debug!(method = %signed.method, uri = %signed.uri(), "Sending request");
        let request = signed.into_http(body)?;
        self.transport.send(request).await
    }

    /// Send a request and read the whole response body
    async fn request_collected(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: &BTreeMap<String, String>,
        body: Body,
    ) -> Result<(StatusCode, HeaderMap, Bytes)> {
        let response = self.send(method, path, query, headers, body).await?;
        let (parts, body) = response.into_parts();
        let body_bytes = body.collect().await?.to_bytes();
        Ok((parts.status, parts.headers, body_bytes))
    }

    // =========================================================================
    // Object operations
    // =========================================================================

    /// PUT `data` to `path`.
    ///
    /// Defaults `Expect: 100-continue` and `x-amz-acl: public-read` unless the
    /// caller sets them; `Content-Length` comes from `data` when absent.
    pub async fn put_object(
        &self,
        path: &str,
        data: Bytes,
        headers: &BTreeMap<String, String>,
    ) -> Result<ObjectInfo> {
        let mut headers = headers.clone();
        set_if_absent(&mut headers, "Content-Length", data.len().to_string());
        self.put_body(path, &headers, full_body(data)).await
    }

    /// PUT the file at `src` to `path`, reading it fully into memory first.
    ///
    /// Adds `Content-Length`, `Content-Type` (from the extension) and
    /// `Content-MD5`; caller headers take precedence.
    pub async fn put_file(
        &self,
        src: impl AsRef<Path>,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<ObjectInfo> {
        let src = src.as_ref();
        // Fail on a bad path before touching the file
        ObjectPath::parse(path)?;
        let data = Bytes::from(tokio::fs::read(src).await?);

        let digest = md5::compute(&data);
        let mut headers = headers.clone();
        set_if_absent(&mut headers, "Content-Length", data.len().to_string());
        set_if_absent(&mut headers, "Content-Type", guess_content_type(src));
        set_if_absent(&mut headers, "Content-MD5", BASE64.encode(&digest[..]));

        self.put_body(path, &headers, full_body(data)).await
    }

    /// PUT the file at `src` to `path`, streaming it from disk
    pub async fn put_stream(
        &self,
        src: impl AsRef<Path>,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<ObjectInfo> {
        let src = src.as_ref();
        ObjectPath::parse(path)?;
        let file = tokio::fs::File::open(src).await?;
        let len = file.metadata().await?.len();

        let mut headers = headers.clone();
        set_if_absent(&mut headers, "Content-Length", len.to_string());
        set_if_absent(&mut headers, "Content-Type", guess_content_type(src));

        let stream = ReaderStream::new(file)
            .map_ok(Frame::data)
            .map_err(S3Error::from);
        let body = StreamBody::new(stream).boxed_unsync();

        self.put_body(path, &headers, body).await
    }

    async fn put_body(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
        body: Body,
    ) -> Result<ObjectInfo> {
        let mut headers = headers.clone();
        set_if_absent(&mut headers, "Expect", "100-continue".to_string());
        set_if_absent(&mut headers, "x-amz-acl", "public-read".to_string());

        let (status, resp_headers, body_bytes) = self
            .request_collected(Method::PUT, path, None, &headers, body)
            .await?;
        check_status(status, &body_bytes)?;

        Ok(ObjectInfo::from_headers(status, &resp_headers))
    }

    /// GET an object into memory
    pub async fn get_object(&self, path: &str, headers: &BTreeMap<String, String>) -> Result<Bytes> {
        let (status, _, body_bytes) = self
            .request_collected(Method::GET, path, None, headers, empty_body())
            .await?;
        check_status(status, &body_bytes)?;
        Ok(body_bytes)
    }

    /// GET an object and stream it into `dest`.
    ///
    /// Returns the number of bytes written.
    pub async fn get_file(
        &self,
        path: &str,
        dest: impl AsRef<Path>,
        headers: &BTreeMap<String, String>,
    ) -> Result<u64> {
        let response = self
            .request(Method::GET, path, headers, empty_body())
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_bytes = response.into_body().collect().await?.to_bytes();
            return Err(status_error(status, &body_bytes));
        }

        let file = tokio::fs::File::create(dest.as_ref()).await?;
        let mut writer = tokio::io::BufWriter::with_capacity(256 * 1024, file);
        let mut body = BodyStream::new(response.into_body());
        let mut total_bytes = 0u64;

        while let Some(frame_result) = body.next().await {
            let frame = frame_result?;
            if let Some(chunk) = frame.data_ref() {
                writer.write_all(chunk).await?;
                total_bytes += chunk.len() as u64;
            }
        }

        writer.flush().await?;
        Ok(total_bytes)
    }

    /// HEAD an object
    pub async fn head_object(
        &self,
        path: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<ObjectInfo> {
        let (status, resp_headers, body_bytes) = self
            .request_collected(Method::HEAD, path, None, headers, empty_body())
            .await?;
        check_status(status, &body_bytes)?;
        Ok(ObjectInfo::from_headers(status, &resp_headers))
    }

    /// DELETE an object
    pub async fn delete_object(&self, path: &str, headers: &BTreeMap<String, String>) -> Result<()> {
        let (status, _, body_bytes) = self
            .request_collected(Method::DELETE, path, None, headers, empty_body())
            .await?;
        check_status(status, &body_bytes)
    }

    // =========================================================================
    // Bucket operations
    // =========================================================================

    /// Create a bucket (PUT bucket)
    pub async fn make_bucket(&self, bucket: &str) -> Result<()> {
        self.bucket_request(Method::PUT, bucket).await
    }

    /// Delete a bucket (DELETE bucket). The bucket must be empty.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.bucket_request(Method::DELETE, bucket).await
    }

    async fn bucket_request(&self, method: Method, bucket: &str) -> Result<()> {
        let path = bucket_path(bucket);
        let (status, _, body_bytes) = self
            .request_collected(method, &path, None, &BTreeMap::new(), empty_body())
            .await?;
        check_status(status, &body_bytes)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List one page of keys under `bucket/prefix`, starting after `marker`.
    /// The service returns at most 1000 keys per page.
    pub async fn list_page(&self, path: &str, marker: Option<&str>) -> Result<ListingPage> {
        let object = ObjectPath::parse(path)?;

        let mut query = String::with_capacity(object.key.len() + 64);
        query.push_str("prefix=");
        encode_query_value_into(&mut query, &object.key);
        if let Some(marker) = marker {
            query.push_str("&marker=");
            encode_query_value_into(&mut query, marker);
        }

        let bucket = bucket_path(&object.bucket);
        let (status, _, body_bytes) = self
            .request_collected(
                Method::GET,
                &bucket,
                Some(&query),
                &BTreeMap::new(),
                empty_body(),
            )
            .await?;
        check_status(status, &body_bytes)?;

        xml::parse_listing_page(&body_bytes)
    }

    /// List every key under `bucket/prefix`, issuing as many page requests
    /// as needed
    pub async fn list_all_keys(&self, path: &str) -> Result<Vec<String>> {
        paginate::list_all_keys(self, path).await
    }

    // =========================================================================
    // URLs
    // =========================================================================

    /// Plain http URL of an object
    pub fn url(&self, path: &str) -> Result<String> {
        self.http_url(path)
    }

    pub fn http_url(&self, path: &str) -> Result<String> {
        let object = ObjectPath::parse(path)?;
        Ok(format!("http://{}{}", self.authority(), object.resource_path()))
    }

    pub fn https_url(&self, path: &str) -> Result<String> {
        let object = ObjectPath::parse(path)?;
        Ok(format!("https://{}{}", self.endpoint(), object.resource_path()))
    }

    /// Pre-signed GET URL valid until `expires`
    pub fn signed_url(&self, path: &str, expires: DateTime<Utc>) -> Result<String> {
        let object = ObjectPath::parse(path)?;
        let epoch = expires.timestamp();
        let signer = self.builder.signer();
        let signature = signer.presign(&object.resource_path(), epoch);

        Ok(format!(
            "{}?Expires={}&AWSAccessKeyId={}&Signature={}",
            self.http_url(path)?,
            epoch,
            signer.access_key(),
            urlencoding::encode(&signature)
        ))
    }

    fn authority(&self) -> String {
        match self.port() {
            80 | 443 => self.endpoint().to_string(),
            port => format!("{}:{}", self.endpoint(), port),
        }
    }
}

impl<T: Transport> PageSource for S3Client<T> {
    async fn fetch_page(&self, path: &str, marker: Option<&str>) -> Result<ListingPage> {
        self.list_page(path, marker).await
    }
}

/// Map a non-2xx response to `S3Error::S3Response`, using the service's
/// error document when there is one
fn check_status(status: StatusCode, body: &[u8]) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(status_error(status, body))
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> S3Error {
    let (code, message) = match xml::parse_error_document(body) {
        Some(doc) => (doc.code, doc.message),
        None => (
            status.canonical_reason().unwrap_or("").to_string(),
            String::from_utf8_lossy(body).to_string(),
        ),
    };
    S3Error::S3Response {
        status,
        code,
        message,
    }
}

/// Insert `name` unless present under any casing
fn set_if_absent(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    if !headers.keys().any(|k| k.eq_ignore_ascii_case(name)) {
        headers.insert(name.to_string(), value);
    }
}

fn guess_content_type(src: &Path) -> String {
    mime_guess::from_path(src)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Bucket-level path: the bucket followed by a slash and an empty key
fn bucket_path(bucket: &str) -> String {
    if bucket.ends_with('/') {
        bucket.to_string()
    } else {
        format!("{}/", bucket)
    }
}
