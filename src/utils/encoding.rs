//! Lenient text decoding.
//!
//! Text and markdown sources are read with:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast path
//! - invalid byte sequences dropped rather than replaced or rejected

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;

/// Read a file and decode it leniently.
///
/// # Returns
/// A tuple `(content, encoding_used)`
pub fn read_file_lenient(path: &Path) -> Result<(String, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(decode_lenient(&bytes))
}

/// Decode bytes, honouring a BOM when present and otherwise assuming UTF-8.
///
/// Invalid sequences are dropped, so the result never contains U+FFFD that
/// was not already in the source.
pub fn decode_lenient(bytes: &[u8]) -> (String, String) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let body = &bytes[bom_len..];
        let label = if encoding == UTF_8 {
            "utf-8-sig".to_string()
        } else {
            encoding.name().to_lowercase()
        };
        return (decode_dropping_invalid(encoding, body), label);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), "utf-8".to_string());
    }

    (drop_invalid_utf8(bytes), "utf-8".to_string())
}

fn decode_dropping_invalid(encoding: &'static Encoding, bytes: &[u8]) -> String {
    if encoding == UTF_8 {
        return drop_invalid_utf8(bytes);
    }
    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => {
            let (text, _) = encoding.decode_without_bom_handling(bytes);
            text.chars().filter(|&c| c != '\u{FFFD}').collect()
        }
    }
}

fn drop_invalid_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("Test content 🚀".as_bytes()).unwrap();
        file.flush().unwrap();

        let (content, encoding) = read_file_lenient(file.path()).unwrap();
        assert_eq!(content, "Test content 🚀");
        assert_eq!(encoding, "utf-8");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let (content, encoding) = decode_lenient(&[0xef, 0xbb, 0xbf, b'H', b'i']);
        assert_eq!(content, "Hi");
        assert_eq!(encoding, "utf-8-sig");
    }

    #[test]
    fn test_utf16_le_bom_is_decoded() {
        let (content, encoding) = decode_lenient(&[0xff, 0xfe, b'o', 0x00, b'k', 0x00]);
        assert_eq!(content, "ok");
        assert_eq!(encoding, "utf-16le");
    }

    #[test]
    fn test_invalid_sequences_are_dropped() {
        let (content, _) = decode_lenient(b"caf\xff\xfee ok");
        assert_eq!(content, "cafe ok");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_file_lenient(Path::new("/definitely/not/here.txt")).is_err());
    }
}
