//! Builders for framed event-stream bodies.

use bytes::Bytes;
use serde_json::Value;

/// Encode `payloads` as frames, followed by the sentinel frame.
#[must_use]
pub fn body(payloads: &[Value]) -> String {
    let mut body = frames(payloads);
    body.push_str("data: [DONE]\n\n");
    body
}

/// Encode `payloads` as frames, without a sentinel.
#[must_use]
pub fn frames(payloads: &[Value]) -> String {
    payloads
        .iter()
        .map(|payload| format!("data: {payload}\n\n"))
        .collect()
}

/// Split `body` into chunks of at most `size` bytes.
///
/// Splits happen on byte boundaries, not character boundaries, exactly like
/// a network transport would.
#[must_use]
pub fn chunked(body: &str, size: usize) -> Vec<Bytes> {
    body.as_bytes()
        .chunks(size.max(1))
        .map(Bytes::copy_from_slice)
        .collect()
}

/// Split `body` at the given byte offsets.
#[must_use]
pub fn split_at(body: &str, offsets: &[usize]) -> Vec<Bytes> {
    let bytes = body.as_bytes();
    let mut chunks = vec![];
    let mut start = 0;

    for &offset in offsets {
        let offset = offset.clamp(start, bytes.len());
        chunks.push(Bytes::copy_from_slice(&bytes[start..offset]));
        start = offset;
    }

    chunks.push(Bytes::copy_from_slice(&bytes[start..]));
    chunks
}
