//! Paginated key listing
//!
//! Pages are fetched strictly one after another: the marker for page N+1 is
//! the last key of page N. The walk stops when a page is not truncated, and
//! fails loudly instead of returning a partial list when the server's pages
//! cannot be continued.

use crate::s3::error::{ProtocolViolation, Result};
use crate::s3::types::ListingPage;
use std::future::Future;
use tracing::{debug, warn};

/// Something that can fetch a single page of keys for `bucket/prefix`,
/// starting after `marker`.
pub trait PageSource: Send + Sync {
    fn fetch_page(
        &self,
        path: &str,
        marker: Option<&str>,
    ) -> impl Future<Output = Result<ListingPage>> + Send;
}

/// Fetch every key under `path`, following markers until the listing
/// is complete.
pub async fn list_all_keys<S: PageSource>(source: &S, path: &str) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    let mut marker: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(path, marker.as_deref()).await?;
        pages += 1;

        debug!(
            path,
            page = pages,
            marker = marker.as_deref().unwrap_or(""),
            keys = page.keys.len(),
            truncated = page.is_truncated,
            "Fetched listing page"
        );

        match next_marker(page, marker.as_deref(), &mut keys) {
            Ok(Some(next)) => marker = Some(next),
            Ok(None) => return Ok(keys),
            Err(violation) => {
                warn!(path, page = pages, error = %violation, "Listing aborted");
                return Err(violation.into());
            }
        }
    }
}

/// Merge one page into `keys` and decide whether to continue.
///
/// Returns the marker for the next request, `None` when the listing is done.
fn next_marker(
    page: ListingPage,
    marker: Option<&str>,
    keys: &mut Vec<String>,
) -> std::result::Result<Option<String>, ProtocolViolation> {
    let ListingPage {
        keys: mut page_keys,
        is_truncated,
    } = page;

    // Asking again for the same marker would return this page forever
    if is_truncated {
        if let (Some(prev), Some(last)) = (marker, page_keys.last()) {
            if last == prev {
                return Err(ProtocolViolation::MarkerNotAdvancing {
                    marker: prev.to_string(),
                });
            }
        }
    }

    // Marker inclusivity is unspecified; drop an echoed marker if present
    if let Some(prev) = marker {
        if page_keys.first().map(String::as_str) == Some(prev) {
            debug!(marker = prev, "Dropping key repeated from previous page");
            page_keys.remove(0);
        }
    }

    if !is_truncated {
        keys.append(&mut page_keys);
        return Ok(None);
    }

    let next = match page_keys.last() {
        Some(last) => last.clone(),
        None => return Err(ProtocolViolation::TruncatedWithoutContents),
    };

    if next.is_empty() {
        return Err(ProtocolViolation::MarkerNotAdvancing { marker: next });
    }

    keys.append(&mut page_keys);
    Ok(Some(next))
}
