//! s3kit - S3 REST client with signed requests and paginated key listing

pub mod cli;
pub mod config;
pub mod s3;

pub use config::{ClientConfig, Config};
pub use s3::{S3Client, S3Error};
