// crates/boundary-core/src/loader/encoding.rs

//! Ordered text-decoding attempts.
//!
//! Korean public datasets ship in a mix of UTF-8 (with and without BOM) and
//! legacy code pages. Sources are decoded by walking a fixed list and taking
//! the first encoding that both decodes and satisfies the caller's parser.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// Strict UTF-8; a leading BOM is kept and will trip a JSON parser.
    Utf8,
    /// UTF-8 with an optional signature (BOM) stripped.
    Utf8Sig,
    /// Windows code page 949 (Unified Hangul Code).
    Cp949,
    /// EUC-KR.
    EucKr,
    /// ISO-8859-1. Every byte maps to a char, so this never fails to decode.
    Latin1,
}

/// Attempt order for GeoJSON sources.
pub const GEOJSON_ENCODINGS: [TextEncoding; 5] = [
    TextEncoding::Utf8,
    TextEncoding::Utf8Sig,
    TextEncoding::Cp949,
    TextEncoding::EucKr,
    TextEncoding::Latin1,
];

/// Attempt order for SQL scripts.
pub const SQL_ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Cp949,
    TextEncoding::EucKr,
    TextEncoding::Latin1,
];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Cp949 => "cp949",
            Self::EucKr => "euc-kr",
            Self::Latin1 => "latin1",
        }
    }

    /// Decodes without replacement characters; `None` on any malformed sequence.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Self::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(Cow::Borrowed)
            }
            // encoding_rs implements the WHATWG "EUC-KR" decoder, which is the
            // CP949 superset; both labels resolve to it.
            Self::Cp949 | Self::EucKr => {
                encoding_rs::EUC_KR.decode_without_bom_handling_and_without_replacement(bytes)
            }
            Self::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Walks `encodings` in order and returns the first one for which the bytes
/// decode and `parse` accepts the text.
pub fn decode_first<T>(
    bytes: &[u8],
    encodings: &[TextEncoding],
    mut parse: impl FnMut(&str) -> Option<T>,
) -> Option<(TextEncoding, T)> {
    encodings.iter().find_map(|enc| {
        let text = enc.decode(bytes)?;
        match parse(&text) {
            Some(v) => Some((*enc, v)),
            None => {
                tracing::debug!(encoding = enc.label(), "decoded but rejected by parser");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_ok(text: &str) -> Option<serde_json::Value> {
        serde_json::from_str(text).ok()
    }

    #[test]
    fn attempt_order_is_fixed() {
        let labels: Vec<_> = GEOJSON_ENCODINGS.iter().map(|e| e.label()).collect();
        assert_eq!(labels, ["utf-8", "utf-8-sig", "cp949", "euc-kr", "latin1"]);

        let labels: Vec<_> = SQL_ENCODINGS.iter().map(|e| e.label()).collect();
        assert_eq!(labels, ["utf-8", "cp949", "euc-kr", "latin1"]);
    }

    #[test]
    fn plain_utf8_wins_first() {
        let bytes = r#"{"name":"종로구"}"#.as_bytes();
        let (enc, v) = decode_first(bytes, &GEOJSON_ENCODINGS, json_ok).unwrap();
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(v["name"], "종로구");
    }

    #[test]
    fn bom_falls_through_to_utf8_sig() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(r#"{"name":"중구"}"#.as_bytes());
        let (enc, v) = decode_first(&bytes, &GEOJSON_ENCODINGS, json_ok).unwrap();
        assert_eq!(enc, TextEncoding::Utf8Sig);
        assert_eq!(v["name"], "중구");
    }

    #[test]
    fn cp949_bytes_decode_as_korean() {
        let (encoded, _, had_errors) = encoding_rs::EUC_KR.encode(r#"{"name":"서울특별시"}"#);
        assert!(!had_errors);
        let (enc, v) = decode_first(&encoded, &GEOJSON_ENCODINGS, json_ok).unwrap();
        assert_eq!(enc, TextEncoding::Cp949);
        assert_eq!(v["name"], "서울특별시");
    }

    #[test]
    fn latin1_always_decodes() {
        let bytes = [0x7B, 0xFF, 0x7D];
        assert!(TextEncoding::Utf8.decode(&bytes).is_none());
        assert_eq!(TextEncoding::Latin1.decode(&bytes).unwrap(), "{\u{ff}}");
    }

    #[test]
    fn nothing_parses_returns_none() {
        assert!(decode_first(b"not json", &GEOJSON_ENCODINGS, json_ok).is_none());
    }
}
