//! Command-line interface for s3kit
//!
//! Object paths are written `bucket/key`; a leading `s3://` is accepted.
//!
//! ```bash
//! # List every key under a prefix
//! s3kit ls my-bucket/photos/
//!
//! # Upload and download
//! s3kit put ./puppy.jpg my-bucket/photos/puppy.jpg
//! s3kit get my-bucket/photos/puppy.jpg ./copy.jpg
//!
//! # Pre-signed link valid for one hour
//! s3kit url my-bucket/photos/puppy.jpg --expires-in 3600
//! ```

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "s3kit")]
#[command(version, about = "S3 REST client with signed requests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (falls back to environment variables)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every key under a prefix
    Ls {
        /// Bucket and optional prefix (bucket/prefix)
        path: String,
    },

    /// Download an object
    Get {
        /// Object path (bucket/key)
        path: String,

        /// Destination file (stdout when omitted)
        dest: Option<String>,
    },

    /// Upload a local file
    Put {
        /// Local source file
        source: String,

        /// Object path (bucket/key)
        path: String,

        /// Stream the file instead of reading it into memory (no Content-MD5)
        #[arg(long)]
        stream: bool,
    },

    /// Remove an object
    Rm {
        /// Object path (bucket/key)
        path: String,
    },

    /// Show object info
    Stat {
        /// Object path (bucket/key)
        path: String,
    },

    /// Make bucket
    Mb {
        /// Bucket name
        bucket: String,
    },

    /// Remove bucket
    Rb {
        /// Bucket name
        bucket: String,
    },

    /// Print a pre-signed GET URL
    Url {
        /// Object path (bucket/key)
        path: String,

        /// Seconds until the link expires
        #[arg(long, default_value = "3600")]
        expires_in: i64,
    },
}
