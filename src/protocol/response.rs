//! The fixed response payload
//!
//! Written in one shot per serviced connection. Interoperability tests
//! assert byte-for-byte equality against this constant, so any edit here
//! is a wire-format change.

pub const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: text/plain\r\n\
Content-Length: 13\r\n\
Connection: close\r\n\
\r\n\
Hello, world!";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_length_matches_body() {
        let text = std::str::from_utf8(RESPONSE).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();

        let declared: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap();

        assert_eq!(declared, body.len());
        assert_eq!(body, "Hello, world!");
    }
}
