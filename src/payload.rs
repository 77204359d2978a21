//! Byte-payload normalization
//!
//! A `Bytes` contract argument may arrive as base64 text, as JSON text, as
//! arbitrary text, or as an already-binary buffer. A single string can be
//! valid base64 and valid JSON at the same time (`"1234"`, `"true"`), so
//! the interpretations are tried in a fixed, named order.

use crate::error::{Result, XdrAsmError};
use crate::value::ArgValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// One way of reading text as a byte payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytePayloadProbe {
    /// Canonical padded base64 that is not also JSON; yields the decoded bytes
    Base64,
    /// Any JSON document; yields the original text, never the parsed value
    JsonText,
    /// Fallback; yields the text's UTF-8 bytes
    Utf8,
}

/// Probes are tried in this order and the first match wins.
pub const BYTE_PROBE_ORDER: [BytePayloadProbe; 3] = [
    BytePayloadProbe::Base64,
    BytePayloadProbe::JsonText,
    BytePayloadProbe::Utf8,
];

fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text).is_ok()
}

impl BytePayloadProbe {
    pub fn try_as(self, text: &str) -> Option<Vec<u8>> {
        match self {
            // JSON-ness only disqualifies base64; it never changes the bytes
            BytePayloadProbe::Base64 => {
                if is_json(text) {
                    return None;
                }
                STANDARD.decode(text).ok()
            }
            BytePayloadProbe::JsonText => is_json(text).then(|| text.as_bytes().to_vec()),
            BytePayloadProbe::Utf8 => Some(text.as_bytes().to_vec()),
        }
    }
}

/// Run the text probes in [`BYTE_PROBE_ORDER`].
pub fn normalize_text(text: &str) -> Vec<u8> {
    for probe in BYTE_PROBE_ORDER {
        if let Some(bytes) = probe.try_as(text) {
            tracing::trace!(?probe, len = bytes.len(), "byte payload normalized");
            return bytes;
        }
    }
    text.as_bytes().to_vec()
}

/// Produce the canonical byte buffer for a `Bytes` argument.
pub fn normalize_bytes(input: &ArgValue) -> Result<Vec<u8>> {
    match input {
        ArgValue::Text(text) => Ok(normalize_text(text)),
        ArgValue::Binary(bytes) => Ok(bytes.clone()),
        // an object is kept as its JSON text, like a JSON string would be
        ArgValue::Object(fields) => Ok(serde_json::Value::Object(fields.clone()).to_string().into_bytes()),
        ArgValue::Null => Err(XdrAsmError::MissingArgument("bytes value".to_string())),
        other => Err(XdrAsmError::TypeMismatch {
            expected: "bytes, base64 or text",
            found: other.kind_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_branch() {
        let out = normalize_bytes(&ArgValue::Text("aGVsbG8=".to_string())).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_json_object_branch() {
        let text = "{\"a\":1}";
        let out = normalize_bytes(&ArgValue::Text(text.to_string())).unwrap();
        assert_eq!(out, text.as_bytes());
    }

    #[test]
    fn test_json_wins_over_base64_when_both_decode() {
        // all three are four base64 characters and also valid JSON
        for text in ["1234", "true", "null"] {
            assert!(STANDARD.decode(text).is_ok(), "{} should decode as base64", text);
            let out = normalize_bytes(&ArgValue::Text(text.to_string())).unwrap();
            assert_eq!(out, text.as_bytes(), "input {}", text);
        }
    }

    #[test]
    fn test_json_object_value_kept_as_text() {
        let value = ArgValue::from(serde_json::json!({"lat": 48, "lng": 2}));
        assert_eq!(normalize_bytes(&value).unwrap(), br#"{"lat":48,"lng":2}"#);
    }

    #[test]
    fn test_utf8_fallback_branch() {
        let out = normalize_bytes(&ArgValue::Text("hello world!".to_string())).unwrap();
        assert_eq!(out, b"hello world!");
        assert_eq!(BytePayloadProbe::Base64.try_as("hello world!"), None);
        assert_eq!(BytePayloadProbe::JsonText.try_as("hello world!"), None);
    }

    #[test]
    fn test_non_canonical_base64_falls_through() {
        // missing padding is not accepted by the standard engine
        let out = normalize_bytes(&ArgValue::Text("aGVsbG8".to_string())).unwrap();
        assert_eq!(out, b"aGVsbG8");
    }

    #[test]
    fn test_binary_passthrough() {
        let raw = vec![0u8, 159, 146, 150];
        let out = normalize_bytes(&ArgValue::Binary(raw.clone())).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_probe_order_is_fixed() {
        assert_eq!(
            BYTE_PROBE_ORDER,
            [BytePayloadProbe::Base64, BytePayloadProbe::JsonText, BytePayloadProbe::Utf8]
        );
    }

    #[test]
    fn test_integer_is_rejected() {
        assert!(matches!(
            normalize_bytes(&ArgValue::Int(5)),
            Err(XdrAsmError::TypeMismatch { .. })
        ));
    }
}
