use super::ParseError;
use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_8};

/// Decodes raw page bytes into text.
///
/// netkeiba serves EUC-JP on its database host and UTF-8 on the race host,
/// with Shift_JIS surviving in older archive pages. Encodings are tried in
/// that order and the first clean decode wins; bytes no candidate accepts are
/// an error.
pub fn decode_html(raw: &[u8]) -> Result<String, ParseError> {
    for encoding in [EUC_JP, UTF_8, SHIFT_JIS] {
        let (text, had_errors) = encoding.decode_without_bom_handling(raw);
        if !had_errors {
            return Ok(text.into_owned());
        }
    }
    Err(ParseError::Decode)
}
