//! Callback wrapper detection.
//!
//! Wrapped files look like
//!
//! ```text
//! // Generated by gitdb. DO NOT EDIT.
//! callback(
//! [ ... ]
//! )
//! ```
//!
//! Detection only inspects the first and last [`LOOKAHEAD`] bytes. Wrapper
//! text further than that from either edge is not recognized.

use std::ops::Range;

/// Bytes inspected at each end of the file.
pub const LOOKAHEAD: usize = 100;

const fn is_open(b: u8) -> bool {
    matches!(b, b'[' | b'{')
}

const fn is_close(b: u8) -> bool {
    matches!(b, b']' | b'}')
}

/// The byte range of `data` holding the JSON payload.
///
/// The payload starts after the last `(` preceding the first `[`/`{` of the
/// head window, and ends at the last `)` following the last `]`/`}` of the
/// tail window. Without a match on either side the whole buffer is used.
pub fn payload_bounds(data: &[u8]) -> Range<usize> {
    let head = &data[..data.len().min(LOOKAHEAD)];
    let start = head
        .iter()
        .position(|&b| is_open(b))
        .and_then(|open| head[..open].iter().rposition(|&b| b == b'('))
        .map_or(0, |paren| paren + 1);

    let tail_start = data.len().saturating_sub(LOOKAHEAD);
    let tail = &data[tail_start..];
    let end = tail
        .iter()
        .rposition(|&b| is_close(b))
        .and_then(|close| {
            tail[close..]
                .iter()
                .rposition(|&b| b == b')')
                .map(|paren| close + paren)
        })
        .map_or(data.len(), |paren| tail_start + paren);

    start..end.max(start)
}
