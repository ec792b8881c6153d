//! Content-Length framing (C1).
//!
//! Wire format: `Content-Length: N\r\n\r\n` followed by exactly `N` UTF-8
//! bytes. `N` is a byte count, never a character count.

use crate::{Error, Result};

/// 1 MiB cap on a single frame body, shared with the reassembly buffer (C2).
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Outcome of scanning a buffer for one frame (§4.1 "Parse").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub content_length: usize,
    pub header_end_offset: usize,
}

/// Encode a JSON-RPC payload as a Content-Length frame.
///
/// Fails with `Error::Frame` when `s` is empty or exceeds `MAX_FRAME_BYTES`.
pub fn encode(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() {
        return Err(Error::Frame("empty body".to_string()));
    }
    let body = s.as_bytes();
    if body.len() > MAX_FRAME_BYTES {
        return Err(Error::Frame(format!(
            "body of {} bytes exceeds {} byte cap",
            body.len(),
            MAX_FRAME_BYTES
        )));
    }

    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(b"Content-Length: ");
    out.extend_from_slice(body.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n\r\n");
    out.extend_from_slice(body);
    Ok(out)
}

/// Locate the earliest header/body separator: `\r\n\r\n` preferred, `\n\n`
/// tolerated (§4.1 step 1).
fn find_separator(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = buf
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| (pos, pos + 4));
    let lf = buf
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| (pos, pos + 2));

    match (crlf, lf) {
        (Some(c), Some(l)) => Some(if c.0 <= l.0 { c } else { l }),
        (Some(c), None) => Some(c),
        (None, Some(l)) => Some(l),
        (None, None) => None,
    }
}

/// Scan `header` for a line whose lowercased, trimmed left side *ends with*
/// `content-length`. This intentionally matches a trailing substring, not
/// equality, to recover from fragmentation that truncates the header keyword
/// mid-word (§9 "Why header substring match", §8 property 4).
fn find_content_length(header: &str) -> Option<std::result::Result<usize, ()>> {
    for line in header.split(['\r', '\n']) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() || !key.ends_with("content-length") {
            continue;
        }
        if !key.contains("-length") {
            // A bare "length" line (or anything lacking the hyphenated
            // keyword) is not a fragmentation remnant; ignore it.
            continue;
        }
        let value = value.trim();
        return Some(value.parse::<usize>().map_err(|_| ()));
    }
    None
}

/// Parse outcome for `try_parse` (§4.1 "Parse"). `NeedMoreData` means the
/// header block has not arrived yet; `Malformed` means the connection must
/// be faulted (§4.1 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    NeedMoreData,
    Malformed,
    Complete(ParsedHeader),
    Incomplete(ParsedHeader),
}

/// Whether `buf` already has a complete `\r\n\r\n`/`\n\n`-terminated header
/// block, regardless of whether that header parses (§4.2 step 3: a buffer
/// that's merely still accumulating header bytes is fragmentation, not
/// line noise).
pub fn has_complete_header_block(buf: &[u8]) -> bool {
    find_separator(buf).is_some()
}

/// Whether `buf` contains a `content-length` substring anywhere ahead of
/// any header separator (§9 "Why header substring match"): used by the
/// reassembly buffer's eviction safeguard to tell a large-but-legitimate
/// frame still waiting on more body bytes from actual line noise.
pub fn contains_content_length_substring(buf: &[u8]) -> bool {
    let scan_end = find_separator(buf).map(|(sep_start, _)| sep_start).unwrap_or(buf.len());
    let Ok(scanned) = std::str::from_utf8(&buf[..scan_end]) else {
        return false;
    };
    scanned.to_ascii_lowercase().contains("content-length")
}

/// Parse a buffer for the next frame's header (§4.1 "Parse" steps 1-4).
pub fn try_parse(buf: &[u8]) -> ParseOutcome {
    let Some((sep_start, header_end_offset)) = find_separator(buf) else {
        return ParseOutcome::NeedMoreData;
    };

    let header_bytes = &buf[..sep_start];
    let Ok(header) = std::str::from_utf8(header_bytes) else {
        return ParseOutcome::Malformed;
    };

    let content_length = match find_content_length(header) {
        None => return ParseOutcome::Malformed,
        Some(Err(())) => return ParseOutcome::Malformed,
        Some(Ok(n)) => n,
    };

    if content_length > MAX_FRAME_BYTES {
        return ParseOutcome::Malformed;
    }

    let parsed = ParsedHeader {
        content_length,
        header_end_offset,
    };

    if buf.len() >= header_end_offset + content_length {
        ParseOutcome::Complete(parsed)
    } else {
        ParseOutcome::Incomplete(parsed)
    }
}

/// Extract the JSON payload and remaining tail bytes given a completed
/// parse (§4.1 "Extract").
pub fn extract(buf: &[u8], parsed: ParsedHeader) -> Result<(String, Vec<u8>)> {
    let body_start = parsed.header_end_offset;
    let body_end = body_start + parsed.content_length;
    let body = &buf[body_start..body_end];
    let payload = String::from_utf8(body.to_vec())
        .map_err(|e| Error::Frame(format!("body is not valid UTF-8: {}", e)))?;
    let tail = buf[body_end..].to_vec();
    Ok((payload, tail))
}
