//! The opaque cursor wire format and its extension points.
//!
//! A cursor is `base64url(urlencode(k1=v1&k2=v2&...))` without padding,
//! fields in declared sort order. Decoding yields raw strings; coercing
//! them into typed values is a separate, injectable parse step, so the
//! same wire format serves untyped string fields and typed numeric or
//! date fields without the codec knowing the schema.

use crate::error::PaginateError;
use base64::prelude::*;
use model::core::value::Value;

/// Encodes and decodes opaque cursor strings.
///
/// Implementations must be pure: same pairs in, same token out, and
/// `decode` must reject tokens whose key sequence differs from the
/// expected one. The default codec can be replaced wholesale, e.g. with a
/// signed format when cursors must be tamper-resistant.
pub trait CursorCodec: Send + Sync {
    fn encode(&self, values: &[(&str, &Value)]) -> Result<String, PaginateError>;

    fn decode(
        &self,
        cursor: &str,
        expected_keys: &[&str],
    ) -> Result<Vec<(String, String)>, PaginateError>;
}

/// Coerces one decoded raw-string field into the typed value used by the
/// keyset predicate. The default keeps raw strings untyped.
pub trait ParseCursor: Send + Sync {
    fn parse(&self, key: &str, raw: &str) -> Result<Value, PaginateError>;
}

impl<F> ParseCursor for F
where
    F: Fn(&str, &str) -> Result<Value, PaginateError> + Send + Sync,
{
    fn parse(&self, key: &str, raw: &str) -> Result<Value, PaginateError> {
        self(key, raw)
    }
}

/// Identity parser: every decoded field stays a string.
#[derive(Debug, Default, Clone)]
pub struct RawStrings;

impl ParseCursor for RawStrings {
    fn parse(&self, _key: &str, raw: &str) -> Result<Value, PaginateError> {
        Ok(Value::String(raw.to_string()))
    }
}

/// The default form-encoded, base64url cursor codec.
#[derive(Debug, Default, Clone)]
pub struct DefaultCodec;

impl DefaultCodec {
    /// Serializes one value into its raw wire string. The supported kinds
    /// are a closed set; everything else fails fast rather than being
    /// stringified lossily.
    fn raw(value: &Value) -> Result<String, PaginateError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Uint(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Boolean(v) => Ok(v.to_string()),
            Value::Date(d) => Ok(d.to_string()),
            Value::Timestamp(ts) => Ok(ts.to_rfc3339()),
            Value::Uuid(u) => Ok(u.to_string()),
            Value::Null => Err(PaginateError::UnsupportedCursorValueType("null")),
        }
    }
}

impl CursorCodec for DefaultCodec {
    fn encode(&self, values: &[(&str, &Value)]) -> Result<String, PaginateError> {
        let mut form = String::new();
        for (i, (key, value)) in values.iter().enumerate() {
            if i > 0 {
                form.push('&');
            }
            encode_component(&mut form, key);
            form.push('=');
            encode_component(&mut form, &Self::raw(value)?);
        }
        Ok(BASE64_URL_SAFE_NO_PAD.encode(form.as_bytes()))
    }

    fn decode(
        &self,
        cursor: &str,
        expected_keys: &[&str],
    ) -> Result<Vec<(String, String)>, PaginateError> {
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|_| PaginateError::UnparsableCursor)?;
        let form = String::from_utf8(bytes).map_err(|_| PaginateError::UnparsableCursor)?;

        let mut pairs = Vec::new();
        if !form.is_empty() {
            for pair in form.split('&') {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                pairs.push((decode_component(key)?, decode_component(value)?));
            }
        }

        if pairs.len() != expected_keys.len() {
            return Err(PaginateError::FieldCountMismatch {
                expected: expected_keys.len(),
                actual: pairs.len(),
            });
        }

        for (i, (key, _)) in pairs.iter().enumerate() {
            if key != expected_keys[i] {
                return Err(PaginateError::FieldNameMismatch {
                    position: i,
                    expected: expected_keys[i].to_string(),
                    actual: key.clone(),
                });
            }
        }

        Ok(pairs)
    }
}

// Form encoding of a single key or value: unreserved bytes pass through,
// space becomes '+', everything else is percent-escaped. No crate in the
// dependency tree covers application/x-www-form-urlencoded, so this stays
// local to the codec.
fn encode_component(out: &mut String, s: &str) {
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push_str(&format!("{b:02X}"));
            }
        }
    }
}

fn decode_component(s: &str) -> Result<String, PaginateError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(PaginateError::UnparsableCursor);
                }
                let hi = hex_digit(bytes[i + 1])?;
                let lo = hex_digit(bytes[i + 2])?;
                out.push(hi * 16 + lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| PaginateError::UnparsableCursor)
}

fn hex_digit(b: u8) -> Result<u8, PaginateError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(PaginateError::UnparsableCursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn encode(values: &[(&str, &Value)]) -> String {
        DefaultCodec.encode(values).unwrap()
    }

    fn decode(cursor: &str, keys: &[&str]) -> Result<Vec<(String, String)>, PaginateError> {
        DefaultCodec.decode(cursor, keys)
    }

    #[test]
    fn encodes_to_known_token() {
        // base64url("name=foo&id=1"), no padding
        let cursor = encode(&[
            ("name", &Value::String("foo".to_string())),
            ("id", &Value::Int(1)),
        ]);
        assert_eq!(cursor, "bmFtZT1mb28maWQ9MQ");

        let decoded = decode(&cursor, &["name", "id"]).unwrap();
        assert_eq!(
            decoded,
            vec![
                ("name".to_string(), "foo".to_string()),
                ("id".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn round_trips_every_supported_kind() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        let uuid = Uuid::nil();

        let values: Vec<(&str, Value)> = vec![
            ("s", Value::String("hello world & more".to_string())),
            ("i", Value::Int(-42)),
            ("u", Value::Uint(42)),
            ("f", Value::Float(1.5)),
            ("b", Value::Boolean(true)),
            ("d", Value::Date(date)),
            ("t", Value::Timestamp(ts)),
            ("id", Value::Uuid(uuid)),
        ];
        let refs: Vec<(&str, &Value)> = values.iter().map(|(k, v)| (*k, v)).collect();
        let keys: Vec<&str> = values.iter().map(|(k, _)| *k).collect();

        let decoded = decode(&encode(&refs), &keys).unwrap();

        assert_eq!(decoded[0].1, "hello world & more");
        assert_eq!(decoded[1].1, "-42");
        assert_eq!(decoded[2].1, "42");
        assert_eq!(decoded[3].1, "1.5");
        assert_eq!(decoded[4].1, "true");
        assert_eq!(decoded[5].1, "2024-03-09");
        assert_eq!(decoded[6].1, "2024-03-09T12:30:00+00:00");
        assert_eq!(decoded[7].1, "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn rejects_null_values() {
        let err = DefaultCodec
            .encode(&[("id", &Value::Null)])
            .unwrap_err();
        assert!(matches!(
            err,
            PaginateError::UnsupportedCursorValueType("null")
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode("not base64!!!", &["id"]),
            Err(PaginateError::UnparsableCursor)
        ));
    }

    #[test]
    fn rejects_field_count_mismatch() {
        let cursor = encode(&[("id", &Value::Int(1))]);
        assert!(matches!(
            decode(&cursor, &["id", "name"]),
            Err(PaginateError::FieldCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn rejects_field_name_mismatch() {
        let cursor = encode(&[
            ("name", &Value::String("foo".to_string())),
            ("id", &Value::Int(1)),
        ]);

        // Same keys, different order: order is part of the contract.
        let err = decode(&cursor, &["id", "name"]).unwrap_err();
        assert!(matches!(
            err,
            PaginateError::FieldNameMismatch { position: 0, .. }
        ));
    }

    #[test]
    fn percent_escapes_reserved_characters() {
        let cursor = encode(&[("q", &Value::String("a=b&c %".to_string()))]);
        let decoded = decode(&cursor, &["q"]).unwrap();
        assert_eq!(decoded[0].1, "a=b&c %");
    }

    #[test]
    fn rejects_truncated_percent_escape() {
        // "q=%4" — escape sequence cut short
        let cursor = BASE64_URL_SAFE_NO_PAD.encode(b"q=%4");
        assert!(matches!(
            decode(&cursor, &["q"]),
            Err(PaginateError::UnparsableCursor)
        ));
    }
}
