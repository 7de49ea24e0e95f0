//! XML response parsing
//!
//! Streaming parse with byte-slice tag matching. A listing with a single
//! `<Contents>` entry and one with many go through the same code path, so
//! callers always get a plain `Vec` of keys.

use crate::s3::error::{Result, S3Error};
use crate::s3::types::{ErrorDocument, ListingPage};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parse a `ListBucketResult` document into a page of keys.
///
/// `IsTruncated` counts only when its text is exactly `true`.
pub fn parse_listing_page(xml_data: &[u8]) -> Result<ListingPage> {
    let mut reader = Reader::from_reader(xml_data);

    let mut page = ListingPage::default();
    let mut saw_root = false;
    let mut in_contents = false;
    let mut current_text = String::with_capacity(256);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_text.clear();
                match e.local_name().as_ref() {
                    b"ListBucketResult" => saw_root = true,
                    b"Contents" => in_contents = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                current_text.clear();
                match e.local_name().as_ref() {
                    b"ListBucketResult" => saw_root = true,
                    b"Key" if in_contents => page.keys.push(String::new()),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                current_text.push_str(&e.unescape()?);
            }
            Ok(Event::CData(e)) => {
                current_text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Key" if in_contents => {
                        page.keys.push(std::mem::take(&mut current_text));
                    }
                    b"Contents" => in_contents = false,
                    b"IsTruncated" if !in_contents => {
                        page.is_truncated = current_text.trim() == "true";
                    }
                    _ => {}
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(S3Error::XmlParse(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(S3Error::XmlParse(
            "missing ListBucketResult element".to_string(),
        ));
    }

    Ok(page)
}

/// Parse a service `<Error>` document, if the body is one
pub fn parse_error_document(xml_data: &[u8]) -> Option<ErrorDocument> {
    let mut reader = Reader::from_reader(xml_data);

    let mut doc = ErrorDocument::default();
    let mut saw_root = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_text.clear();
                if e.local_name().as_ref() == b"Error" {
                    saw_root = true;
                }
            }
            Ok(Event::Text(e)) => {
                current_text.push_str(&e.unescape().ok()?);
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Code" => doc.code = std::mem::take(&mut current_text),
                    b"Message" => doc.message = std::mem::take(&mut current_text),
                    _ => {}
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    saw_root.then_some(doc)
}
