use crate::s3::S3Client;
use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::io::Write;
use tokio::io::AsyncWriteExt;

/// Accept both `s3://bucket/key` and `bucket/key`
pub fn strip_scheme(path: &str) -> &str {
    let path = path.trim();
    path.strip_prefix("s3://").unwrap_or(path)
}

/// Format bytes in human-readable form (B, KB, MB, GB, TB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let value = bytes_f64 / 1024_f64.powi(exponent as i32);

    if exponent == 0 {
        format!("{} {}", bytes, UNITS[exponent])
    } else {
        format!("{:.2} {}", value, UNITS[exponent])
    }
}

/// List objects command
pub async fn cmd_ls(client: &S3Client, path: &str) -> Result<()> {
    // A bare bucket name lists the whole bucket
    let path = match strip_scheme(path) {
        p if p.contains('/') => p.to_string(),
        p => format!("{}/", p),
    };
    let path = path.as_str();
    let keys = client
        .list_all_keys(path)
        .await
        .context(format!("Failed to list {}", path))?;

    // Buffer stdout to avoid per-line flush syscalls on large listings
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::with_capacity(64 * 1024, stdout.lock());
    for key in &keys {
        writeln!(out, "{}", key)?;
    }
    out.flush()?;

    tracing::info!(path, count = keys.len(), "Listing complete");
    Ok(())
}

/// Download command; writes to stdout when no destination is given
pub async fn cmd_get(client: &S3Client, path: &str, dest: Option<&str>) -> Result<()> {
    let path = strip_scheme(path);
    let no_headers = BTreeMap::new();

    match dest {
        Some(dest) => {
            let bytes = client
                .get_file(path, dest, &no_headers)
                .await
                .context(format!("Failed to download {}", path))?;
            println!("{} -> {} ({})", path, dest, format_bytes(bytes));
        }
        None => {
            let data = client
                .get_object(path, &no_headers)
                .await
                .context(format!("Failed to download {}", path))?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// Upload command
pub async fn cmd_put(client: &S3Client, source: &str, path: &str, stream: bool) -> Result<()> {
    let path = strip_scheme(path);
    let no_headers = BTreeMap::new();

    let info = if stream {
        client.put_stream(source, path, &no_headers).await
    } else {
        client.put_file(source, path, &no_headers).await
    }
    .context(format!("Failed to upload {} to {}", source, path))?;

    match info.etag {
        Some(etag) => println!("{} -> {} (ETag {})", source, path, etag),
        None => println!("{} -> {}", source, path),
    }

    Ok(())
}

/// Remove object command
pub async fn cmd_rm(client: &S3Client, path: &str) -> Result<()> {
    let path = strip_scheme(path);
    client
        .delete_object(path, &BTreeMap::new())
        .await
        .context(format!("Failed to remove {}", path))?;

    println!("Removed: {}", path);
    Ok(())
}

/// Object info command
pub async fn cmd_stat(client: &S3Client, path: &str) -> Result<()> {
    let path = strip_scheme(path);
    let info = client
        .head_object(path, &BTreeMap::new())
        .await
        .context(format!("Failed to stat {}", path))?;

    println!("Object: {}", path);
    if let Some(size) = info.content_length {
        println!("Size: {} ({})", format_bytes(size), size);
    }
    println!(
        "Last Modified: {}",
        info.last_modified.as_deref().unwrap_or("Unknown")
    );
    if let Some(ref content_type) = info.content_type {
        println!("Content-Type: {}", content_type);
    }
    if let Some(ref etag) = info.etag {
        println!("ETag: {}", etag);
    }
    for (name, value) in &info.metadata {
        println!("Meta {}: {}", name, value);
    }

    Ok(())
}

/// Make bucket command
pub async fn cmd_mb(client: &S3Client, bucket: &str) -> Result<()> {
    let bucket = strip_scheme(bucket);
    client
        .make_bucket(bucket)
        .await
        .context(format!("Failed to create bucket {}", bucket))?;

    println!("Bucket created: {}", bucket.trim_end_matches('/'));
    Ok(())
}

/// Remove bucket command
pub async fn cmd_rb(client: &S3Client, bucket: &str) -> Result<()> {
    let bucket = strip_scheme(bucket);
    client
        .delete_bucket(bucket)
        .await
        .context(format!("Failed to delete bucket {}", bucket))?;

    println!("Bucket deleted: {}", bucket.trim_end_matches('/'));
    Ok(())
}

/// Pre-signed URL command
pub async fn cmd_url(client: &S3Client, path: &str, expires_in: i64) -> Result<()> {
    let path = strip_scheme(path);
    let expires = expiry_after(Utc::now(), expires_in)?;

    let url = client.signed_url(path, expires)?;
    println!("{}", url);
    Ok(())
}

/// `now` plus `seconds`, rejecting non-positive or unrepresentable offsets
pub fn expiry_after(now: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    let ttl = TimeDelta::try_seconds(seconds)
        .filter(|ttl| *ttl > TimeDelta::zero())
        .ok_or_else(|| anyhow::anyhow!("--expires-in must be a positive number of seconds"))?;

    now.checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("--expires-in {} is too far in the future", seconds))
}
