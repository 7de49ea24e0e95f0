//! S3 request signer (HMAC-SHA1, base64)
//!
//! Two flavours share the same primitive:
//! - header authentication: `Authorization: AWS <access key>:<signature>` over
//!   the canonical request
//! - query authentication (pre-signed URLs): signature over
//!   `GET\n\n\n<expires epoch>\n<resource>`
//!
//! Signing is pure and deterministic; nothing is cached between calls.

use crate::s3::canonical::CanonicalRequest;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Verb used for pre-signed URLs; this client only presigns downloads
const PRESIGNED_VERB: &str = "GET";

/// S3 signer holding the client's immutable credentials
#[derive(Clone)]
pub struct S3SignerV2 {
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for S3SignerV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3SignerV2")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl S3SignerV2 {
    /// Create a new signer
    pub fn new(access_key: String, secret_key: String) -> Self {
        Self {
            access_key,
            secret_key,
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Base64 HMAC-SHA1 of `string_to_sign` keyed with the secret
    pub fn sign(&self, string_to_sign: &str) -> String {
        sign(&self.secret_key, string_to_sign)
    }

    /// Value of the `Authorization` header for a canonical request
    pub fn authorization(&self, canonical: &CanonicalRequest) -> String {
        let string_to_sign = canonical.string_to_sign();
        tracing::debug!(string_to_sign = ?string_to_sign, "Built string to sign");
        format!("AWS {}:{}", self.access_key, self.sign(&string_to_sign))
    }

    /// Signature for a pre-signed URL expiring at `expires` (epoch seconds).
    /// `resource` is the encoded `/bucket/key` path.
    pub fn presign(&self, resource: &str, expires: i64) -> String {
        self.sign(&presigned_string_to_sign(resource, expires))
    }
}

/// Compute Base64(HMAC-SHA1(secret, string_to_sign))
pub fn sign(secret_key: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// String to sign for query authentication: no content lines, no amz headers,
/// expiry in place of the date.
pub fn presigned_string_to_sign(resource: &str, expires: i64) -> String {
    format!("{}\n\n\n{}\n{}", PRESIGNED_VERB, expires, resource)
}
