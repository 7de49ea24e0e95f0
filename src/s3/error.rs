//! S3 client errors

use hyper::StatusCode;
use thiserror::Error;

/// S3 client errors
///
/// Every operation completes with either a value or exactly one of these.
/// Nothing in this crate retries on its own; retry decisions belong to the caller.
#[derive(Error, Debug)]
pub enum S3Error {
    /// Client constructed with missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object path could not be split into bucket and key
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Request could not be assembled from the caller's input (e.g. a header
    /// value with a newline); nothing was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection or HTTP-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server response contradicts its own metadata
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("S3 error: {status} - {code}: {message}")]
    S3Response {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inconsistent listing responses detected by the paginator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Page claimed truncation but carried no key to continue from
    #[error("listing reported as truncated but returned no contents")]
    TruncatedWithoutContents,

    /// Next marker would repeat the previous request
    #[error("listing marker did not advance past {marker:?}")]
    MarkerNotAdvancing { marker: String },
}

pub type Result<T> = std::result::Result<T, S3Error>;

impl From<hyper::Error> for S3Error {
    fn from(err: hyper::Error) -> Self {
        S3Error::Transport(format!("Hyper error: {}", err))
    }
}

impl From<hyper_util::client::legacy::Error> for S3Error {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        S3Error::Transport(format!("Client error: {}", err))
    }
}

impl From<quick_xml::Error> for S3Error {
    fn from(err: quick_xml::Error) -> Self {
        S3Error::XmlParse(err.to_string())
    }
}
