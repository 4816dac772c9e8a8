//! Transfer encoding of file content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use svgo_hosting::Encoding;

use crate::domain::DecodeError;

/// Decode API content into SVG text.
///
/// Base64 content from the contents API is wrapped at 60 columns, so ASCII
/// whitespace is stripped before decoding.
pub fn decode(content: &str, encoding: Encoding) -> Result<String, DecodeError> {
    match encoding {
        Encoding::Utf8 => Ok(content.to_string()),
        Encoding::Base64 => {
            let compact: String = content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = STANDARD.decode(compact)?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

/// Encode SVG text for blob creation.
pub fn encode(text: &str, encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => text.to_string(),
        Encoding::Base64 => STANDARD.encode(text.as_bytes()),
    }
}
