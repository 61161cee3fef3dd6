#![forbid(unsafe_code)]

//! Serde helper for `f64` fields that may hold NaN or infinities.
//!
//! `serde_json` has no representation for non-finite numbers and silently
//! writes them as `null`, which then fails to decode. Fields using this module
//! keep finite values as plain numbers and write the rest as text:
//!
//! | Value            | Encoded as          |
//! |------------------|---------------------|
//! | finite           | number              |
//! | `+inf` / `-inf`  | `"inf"` / `"-inf"`  |
//! | canonical NaN    | `"NaN"`             |
//! | any other NaN    | `"NaN:0x<bits>"`    |
//!
//! Every `f64` bit pattern decodes to the bits it was encoded from.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Gauge {
//!     #[serde(with = "pagedo_core::float")]
//!     level: f64,
//! }
//!
//! let json = serde_json::to_string(&Gauge { level: f64::INFINITY }).unwrap();
//! assert_eq!(json, r#"{"level":"inf"}"#);
//! let back: Gauge = serde_json::from_str(&json).unwrap();
//! assert_eq!(back.level, f64::INFINITY);
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

const NAN_BITS_PREFIX: &str = "NaN:0x";

/// Serialize `value`, writing non-finite values as text.
pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let value = *value;
    if value.is_finite() {
        return serializer.serialize_f64(value);
    }
    if value.is_nan() {
        let bits = value.to_bits();
        if bits == f64::NAN.to_bits() {
            return serializer.serialize_str("NaN");
        }
        return serializer.serialize_str(&format!("{NAN_BITS_PREFIX}{bits:016x}"));
    }
    serializer.serialize_str(if value > 0.0 { "inf" } else { "-inf" })
}

/// Deserialize a value written by [`serialize`].
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(FloatVisitor)
}

/// Parse the textual form of a non-finite value.
#[must_use]
pub fn parse_text(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => {
            let hex = text.strip_prefix(NAN_BITS_PREFIX)?;
            let value = f64::from_bits(u64::from_str_radix(hex, 16).ok()?);
            value.is_nan().then_some(value)
        }
    }
}

struct FloatVisitor;

impl<'de> Visitor<'de> for FloatVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, \"NaN\", \"inf\" or \"-inf\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        parse_text(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}
