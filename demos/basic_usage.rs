//! Basic usage example for s3kit
//!
//! Uploads an object, reads it back, lists the prefix and prints a
//! pre-signed link. Credentials come from the environment
//! (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, optional `S3_ENDPOINT`,
//! `S3_PORT`).
//!
//! Run with:
//! ```
//! cargo run --example basic_usage -- my-bucket
//! ```

use chrono::{TimeDelta, Utc};
use s3kit::config::load_from_env;
use s3kit::S3Client;
use std::collections::BTreeMap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let bucket = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: basic_usage <bucket>"))?;

    let config = load_from_env()?;
    let profile = config
        .get_profile(None)
        .ok_or_else(|| anyhow::anyhow!("no credentials configured"))?;
    let client = S3Client::new(profile)?;

    println!("s3kit - Basic Usage Example");
    println!("===========================\n");

    let path = format!("{}/test/example.txt", bucket);
    let headers = BTreeMap::new();

    // Example 1: Put object
    println!("1. Uploading object...");
    let info = client
        .put_object(&path, "Hello, s3kit!".into(), &headers)
        .await?;
    println!("   Uploaded with ETag: {:?}\n", info.etag);

    // Example 2: Get object
    println!("2. Downloading object...");
    let data = client.get_object(&path, &headers).await?;
    println!("   Downloaded {} bytes", data.len());
    println!("   Content: {}\n", String::from_utf8_lossy(&data));

    // Example 3: List every key under the prefix
    println!("3. Listing objects with prefix 'test/'...");
    let keys = client.list_all_keys(&format!("{}/test/", bucket)).await?;
    println!("   Found {} objects:", keys.len());
    for key in &keys {
        println!("   - {}", key);
    }
    println!();

    // Example 4: Pre-signed URL
    println!("4. Pre-signed URL valid for 10 minutes:");
    let expires = Utc::now() + TimeDelta::minutes(10);
    println!("   {}\n", client.signed_url(&path, expires)?);

    // Example 5: Delete object
    println!("5. Deleting object...");
    client.delete_object(&path, &headers).await?;
    println!("   Deleted\n");

    Ok(())
}
