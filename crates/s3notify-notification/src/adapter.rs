//! Turns raw upload records into webhook embeds.
//!
//! Object keys arrive query-encoded from the event source (`+` for spaces,
//! `%XX` for everything else). They are decoded once for display, then
//! re-encoded as a URL path for the object link.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
use thiserror::Error;
use tracing::warn;

use crate::types::{EMBED_COLOR, EMBED_DESCRIPTION, EMBED_TITLE, Embed, EmbedField, UploadEvent};

const OBJECT_KEY_PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

const OBJECT_CREATED_PATTERNS: &[&str] = &["ObjectCreated:*", "s3:ObjectCreated:*"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    #[error("invalid percent escape at byte {position}")]
    InvalidEscape { position: usize },
    #[error("decoded key is not valid utf-8")]
    InvalidUtf8,
}

/// Strict query-style decode: every `%` must start a two digit hex escape and
/// the decoded bytes must form valid UTF-8.
pub fn decode_key(raw: &str) -> Result<String, KeyDecodeError> {
    String::from_utf8(unescape_key(raw)?).map_err(|_| KeyDecodeError::InvalidUtf8)
}

/// Best effort decode. A key with a malformed escape is returned untouched so
/// the notification still goes out; decoded bytes that are not UTF-8 are
/// rendered with replacement characters.
pub fn normalize_key(raw: &str) -> String {
    display_key(raw, &unescape_or_raw(raw))
}

pub fn path_encode(key: &str) -> String {
    encode_path_bytes(key.as_bytes())
}

pub fn object_url(bucket: &str, region: &str, decoded_key: &[u8]) -> String {
    format!(
        "https://{bucket}.s3.{region}.amazonaws.com/{}",
        encode_path_bytes(decoded_key)
    )
}

/// The link is built from the decoded bytes, so a key like `bad%FF` still
/// links to `bad%FF` even though its display text is lossy.
pub fn build_document(event: &UploadEvent) -> Embed {
    let decoded = unescape_or_raw(&event.key);
    let display = display_key(&event.key, &decoded);

    Embed {
        title: EMBED_TITLE.to_string(),
        description: EMBED_DESCRIPTION.to_string(),
        url: object_url(&event.bucket, &event.region, &decoded),
        color: EMBED_COLOR,
        fields: vec![
            EmbedField::new("Bucket Name", event.bucket.as_str(), true),
            EmbedField::new("Region", event.region.as_str(), true),
            EmbedField::new("Object Key", format!("`{display}`"), false),
        ],
        timestamp: event.event_time.clone(),
    }
}

fn unescape_key(raw: &str) -> Result<Vec<u8>, KeyDecodeError> {
    let bytes = raw.as_bytes();
    let mut index = 0;
    while let Some(offset) = bytes[index..].iter().position(|byte| *byte == b'%') {
        let position = index + offset;
        let well_formed = bytes
            .get(position + 1..position + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(KeyDecodeError::InvalidEscape { position });
        }
        index = position + 3;
    }

    let spaced = raw.replace('+', " ");
    Ok(percent_decode_str(&spaced).collect())
}

fn unescape_or_raw(raw: &str) -> Vec<u8> {
    unescape_key(raw).unwrap_or_else(|err| {
        warn!(key = raw, error = %err, "failed to decode object key, using raw key");
        raw.as_bytes().to_vec()
    })
}

fn display_key(raw: &str, decoded: &[u8]) -> String {
    match std::str::from_utf8(decoded) {
        Ok(key) => key.to_string(),
        Err(_) => {
            warn!(
                key = raw,
                error = %KeyDecodeError::InvalidUtf8,
                "displaying object key lossily"
            );
            String::from_utf8_lossy(decoded).into_owned()
        }
    }
}

fn encode_path_bytes(bytes: &[u8]) -> String {
    percent_encode(bytes, OBJECT_KEY_PATH_ENCODE_SET).collect()
}

/// Records without an event name are treated as uploads.
pub fn is_object_created(event_name: &str) -> bool {
    event_name.is_empty() || event_matches(OBJECT_CREATED_PATTERNS, event_name)
}

fn event_matches(patterns: &[&str], event_name: &str) -> bool {
    patterns.iter().any(|pattern| {
        if *pattern == event_name {
            return true;
        }

        pattern
            .strip_suffix('*')
            .is_some_and(|prefix| event_name.starts_with(prefix))
    })
}
