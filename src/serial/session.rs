//! Line-oriented session over an open port
//!
//! The runner only needs four operations from a port. Keeping them behind a
//! trait lets the playback loop run against an in-memory device in tests.

use crate::error::Result;
use std::str::Utf8Error;

/// An open, line-oriented connection to a device
pub trait Session {
    /// Write `line` followed by a single `\n`
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Number of bytes buffered by the driver and ready to read
    fn bytes_available(&mut self) -> Result<u32>;

    /// Read up to and including the next `\n`.
    ///
    /// Returns whatever arrived before the read timeout if no terminator
    /// shows up, which may be empty.
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Release the port. Consumes the session so it cannot be closed twice.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Decode one raw line, stripping trailing whitespace.
///
/// `Ok(None)` means the line carried nothing printable (a bare `\r\n`).
pub fn decode_line(raw: &[u8]) -> std::result::Result<Option<String>, Utf8Error> {
    let text = std::str::from_utf8(raw)?.trim_end();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_trailing_whitespace() {
        assert_eq!(decode_line(b"OK\r\n").unwrap(), Some("OK".to_string()));
        assert_eq!(decode_line(b"  LED 0 ON \t\n").unwrap(), Some("  LED 0 ON".to_string()));
    }

    #[test]
    fn test_decode_blank_line() {
        assert_eq!(decode_line(b"\r\n").unwrap(), None);
        assert_eq!(decode_line(b"").unwrap(), None);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(decode_line(&[0xff, 0xfe, b'\n']).is_err());
    }
}
