//! Best-effort request metadata scan
//!
//! The accumulated bytes are rescanned each time new data arrives until
//! the expected total is known. Inputs are raw network bytes, so every
//! step tolerates malformed data by returning None (keep reading).

/// Header section terminator.
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Expected total byte count of the request, once it can be derived.
///
/// Returns `Some(header_len + content_length)` as soon as the buffer
/// contains the full header section AND a parseable, case-insensitive
/// `content-length:` header. Until both hold the caller keeps reading.
///
/// A request that never presents a recognizable length header never
/// completes; this core imposes no timeout or eviction for it.
pub fn expected_total(buf: &[u8]) -> Option<usize> {
    let header_len = find(buf, HEADER_END)? + HEADER_END.len();

    for line in buf[..header_len].split(|&b| b == b'\n') {
        if let Some(value) = header_value(line, b"content-length:") {
            let text = std::str::from_utf8(value).ok()?;
            let length: usize = text.trim().parse().ok()?;
            return Some(header_len + length);
        }
    }

    None
}

/// First line of the request (method + target), for connection logging.
pub fn request_line(buf: &[u8]) -> Option<&str> {
    let end = find(buf, b"\r\n")?;
    std::str::from_utf8(&buf[..end]).ok()
}

/// Value of `line` if it starts with `name` (ASCII case-insensitive).
#[inline]
fn header_value<'a>(line: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    if line.len() < name.len() {
        return None;
    }
    let (head, value) = line.split_at(name.len());
    if head.eq_ignore_ascii_case(name) {
        Some(value)
    } else {
        None
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
