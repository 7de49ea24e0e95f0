//! S3 client module with request signing
//!
//! This module provides:
//! - Canonicalization and HMAC-SHA1 signing of S3 REST requests
//! - Async object and bucket operations (put, get, head, delete)
//! - Paginated key listing with guards against inconsistent pages
//! - Pre-signed URLs

pub mod canonical;
pub mod client;
pub mod error;
pub mod paginate;
pub mod path;
pub mod request;
pub mod signer;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export main types for convenience
pub use canonical::CanonicalRequest;
pub use client::S3Client;
pub use error::{ProtocolViolation, Result, S3Error};
pub use paginate::PageSource;
pub use path::ObjectPath;
pub use request::{RequestBuilder, SignedRequest};
pub use signer::S3SignerV2;
pub use transport::{empty_body, full_body, Body, HyperTransport, Transport};
pub use types::{ErrorDocument, ListingPage, ObjectInfo};
