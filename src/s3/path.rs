//! Object path parsing and URI encoding
//!
//! Paths are written `bucket/key`: everything before the first slash is the
//! bucket, everything after it is the key (which may itself contain slashes
//! or be empty for bucket-level requests).

use crate::s3::error::{Result, S3Error};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Hex lookup table for zero-allocation percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// A bucket and the key inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    pub bucket: String,
    pub key: String,
}

impl ObjectPath {
    /// Split `bucket/key` at the first slash
    pub fn parse(path: &str) -> Result<Self> {
        let (bucket, key) = path.split_once('/').ok_or_else(|| {
            S3Error::InvalidPath(format!(
                "{:?} must have at least one slash to separate the bucket from the key",
                path
            ))
        })?;

        if bucket.is_empty() {
            return Err(S3Error::InvalidPath(format!("{:?} has an empty bucket name", path)));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Percent-encoded `/bucket/key`, used both on the wire and when signing
    pub fn resource_path(&self) -> String {
        let encoded_key = encode_s3_key(&self.key);
        let mut path = String::with_capacity(2 + self.bucket.len() + encoded_key.len());
        path.push('/');
        path.push_str(&encode_s3_key(&self.bucket));
        path.push('/');
        path.push_str(&encoded_key);
        path
    }
}

impl FromStr for ObjectPath {
    type Err = S3Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Encode an S3 key, preserving forward slashes.
/// Returns Cow::Borrowed when no encoding is needed.
pub fn encode_s3_key(key: &str) -> Cow<'_, str> {
    let needs_encoding = key
        .bytes()
        .any(|b| !matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/'));

    if !needs_encoding {
        return Cow::Borrowed(key);
    }

    let mut result = String::with_capacity(key.len() + 32);
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                result.push(byte as char);
            }
            _ => push_escaped(&mut result, byte),
        }
    }
    Cow::Owned(result)
}

/// Encode a query parameter value (RFC 3986 unreserved set) into `buf`
pub fn encode_query_value_into(buf: &mut String, s: &str) {
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                buf.push(byte as char);
            }
            _ => push_escaped(buf, byte),
        }
    }
}

fn push_escaped(buf: &mut String, byte: u8) {
    buf.push('%');
    buf.push(HEX_UPPER[(byte >> 4) as usize] as char);
    buf.push(HEX_UPPER[(byte & 0xf) as usize] as char);
}
