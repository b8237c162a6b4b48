//! Base64 encoding and decoding utilities.
//!
//! The x402 wire format tolerates both the standard and URL-safe base64
//! alphabets, with or without padding. Encoding always produces standard
//! padded base64; [`decode_lenient`] accepts any of the four combinations.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose};
use std::fmt::Display;

const PAD_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional on decode.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PAD_INDIFFERENT);

/// URL-safe alphabet, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PAD_INDIFFERENT);

/// Encodes bytes as standard padded base64.
#[must_use]
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    base64::engine::general_purpose::STANDARD.encode(input.as_ref())
}

/// Decodes base64 in either the standard or URL-safe alphabet, padded or not.
///
/// # Errors
///
/// Returns a decode error if the input is valid in neither alphabet.
pub fn decode_lenient(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let input = input.trim();
    STANDARD_LENIENT
        .decode(input)
        .or_else(|_| URL_SAFE_LENIENT.decode(input))
}

/// A wrapper for base64-encoded byte data.
///
/// This type holds bytes that represent base64-encoded data and provides
/// methods for encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Decodes the base64 string bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        decode_lenient(&String::from_utf8_lossy(&self.0))
    }

    /// Encodes raw binary data into base64 string bytes.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Self {
        Self(encode(input).into_bytes())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl Display for Base64Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_all_four_forms() {
        // Bytes chosen so the encoding contains alphabet-specific characters.
        let bytes = vec![0xfb, 0xef, 0xbf];
        let standard = encode(&bytes);
        assert_eq!(decode_lenient(&standard).unwrap(), bytes);
        assert_eq!(
            decode_lenient(standard.trim_end_matches('=')).unwrap(),
            bytes
        );

        let url_safe = standard.replace('+', "-").replace('/', "_");
        assert_eq!(decode_lenient(&url_safe).unwrap(), bytes);
        assert_eq!(
            decode_lenient(url_safe.trim_end_matches('=')).unwrap(),
            bytes
        );
    }

    #[test]
    fn roundtrip_through_wrapper() {
        let wrapped = Base64Bytes::encode(b"x402");
        assert_eq!(wrapped.decode().unwrap(), b"x402");
        assert_eq!(wrapped.to_string(), "eDQwMg==");
    }
}
