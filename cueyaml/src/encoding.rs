//! Encoding-aware input handling. Available only with the `encoding`
//! feature.
//!
//! YAML streams may arrive as UTF-8 or UTF-16 bytes, with or without a BOM.
//! The decoder's positional model needs one flat UTF-8 buffer, so byte input
//! is transcoded up front; all positions then refer to the decoded text.

use std::borrow::Cow;

use encoding_rs::{DecoderResult, Encoding};

/// Decode a byte buffer into UTF-8 text.
///
/// The encoding is taken from the BOM when present. Without a BOM, UTF-16
/// endianness is guessed from the null-byte pattern of the first two bytes,
/// falling back to UTF-8.
///
/// # Errors
/// Returns a description of the first malformed sequence.
pub(crate) fn decode_bytes(input: &[u8]) -> Result<Cow<'_, str>, String> {
    let (encoding, _) =
        Encoding::for_bom(input).unwrap_or_else(|| (detect_utf16_endianness(input), 0));
    if encoding == encoding_rs::UTF_8 && !input.starts_with(b"\xef\xbb\xbf") {
        return match std::str::from_utf8(input) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(e) => Err(format!("invalid UTF-8 at byte {}", e.valid_up_to())),
        };
    }

    let mut decoder = encoding.new_decoder();
    let mut output = String::with_capacity(input.len());
    let mut total_bytes_read = 0;
    loop {
        match decoder.decode_to_string_without_replacement(
            &input[total_bytes_read..],
            &mut output,
            true,
        ) {
            (DecoderResult::InputEmpty, _) => break Ok(Cow::Owned(output)),
            (DecoderResult::OutputFull, bytes_read) => {
                total_bytes_read += bytes_read;
                // Expect roughly 10% of the remaining bytes to widen.
                output.reserve(input.len() / 10);
            }
            (DecoderResult::Malformed(malformed_len, bytes_after_malformed), bytes_read) => {
                total_bytes_read += bytes_read;
                let byte_idx = total_bytes_read
                    - (malformed_len as usize + bytes_after_malformed as usize);
                break Err(format!("invalid character sequence at byte {byte_idx}"));
            }
        }
    }
}

/// Guess UTF-16 endianness from the null-byte pattern of the first bytes.
///
/// The YAML spec mandates that a document starts with an ASCII character, so
/// a leading null byte reveals a big-endian stream and a null in second
/// position a little-endian one.
fn detect_utf16_endianness(b: &[u8]) -> &'static Encoding {
    if b.len() > 1 && (b[0] != b[1]) {
        if b[0] == 0 {
            return encoding_rs::UTF_16BE;
        } else if b[1] == 0 {
            return encoding_rs::UTF_16LE;
        }
    }
    encoding_rs::UTF_8
}

#[cfg(test)]
mod test {
    use super::decode_bytes;

    #[test]
    fn test_plain_utf8_borrows() {
        let out = decode_bytes(b"a: 1\n").unwrap();
        assert_eq!(&*out, "a: 1\n");
        assert!(matches!(out, std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let out = decode_bytes(b"\xef\xbb\xbfa: 1\n").unwrap();
        assert_eq!(&*out, "a: 1\n");
    }

    #[test]
    fn test_utf16le() {
        let out = decode_bytes(b"\xff\xfea\x00:\x00 \x001\x00\n\x00").unwrap();
        assert_eq!(&*out, "a: 1\n");
    }

    #[test]
    fn test_utf16be_without_bom() {
        let out = decode_bytes(b"\x00a\x00:\x00 \x001\x00\n").unwrap();
        assert_eq!(&*out, "a: 1\n");
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(decode_bytes(b"a: \xa9\n").is_err());
    }
}
