//! Edm primitive value codecs
//!
//! Canonical, round-trippable textual forms for the OData temporal types:
//! - `EdmOffset` (`Z`, `+05:30`)
//! - `EdmTimeOfDay` (`13:45:00.25`)
//! - `EdmDate` (`2024-02-29`, `-0044-03-15`)
//! - `EdmDuration` (`P1DT2H`, `-PT20M`)
//! - `EdmDateTimeOffset` (`2024-02-29T13:45:00+01:00`)
//!
//! Every codec is built through [`EdmPrimitive::create`], which accepts an
//! existing instance (returned unchanged), a native `chrono` value, or text.
//!
//! # Example
//!
//! ```rust
//! use odata_metadata_sdk::primitives::{EdmDuration, EdmPrimitive};
//!
//! let duration = EdmDuration::create("PT120M").unwrap();
//! assert_eq!(duration.to_string(), "PT2H");
//! assert_eq!(EdmDuration::create(duration.clone()).unwrap(), duration);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Picoseconds per second; fractional seconds carry up to 12 digits.
pub const PICOS_PER_SECOND: u64 = 1_000_000_000_000;

/// Maximum number of fractional-second digits accepted by the codecs.
pub const MAX_FRACTION_DIGITS: usize = 12;

/// Error raised when a primitive value cannot be parsed or normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("'{input}' is not a valid {type_name}: {reason}")]
pub struct PrimitiveError {
    /// The offending input (or the computed value for normalization failures)
    pub input: String,
    /// Edm type name, e.g. `Edm.Date`
    pub type_name: String,
    /// What was wrong with it
    pub reason: String,
}

impl PrimitiveError {
    pub fn new(input: impl Into<String>, type_name: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type PrimitiveResult<T> = Result<T, PrimitiveError>;

/// Input accepted by [`EdmPrimitive::create`].
pub enum Source<'a, T: EdmPrimitive> {
    /// An already-typed value, passed through unchanged
    Value(T),
    /// The native `chrono` counterpart
    Native(T::Native),
    /// Textual form
    Text(&'a str),
}

/// Shared shape of the Edm temporal codecs.
pub trait EdmPrimitive: FromStr<Err = PrimitiveError> + fmt::Display + Clone {
    /// Qualified Edm type name used in error messages
    const TYPE_NAME: &'static str;

    /// Native `chrono` representation
    type Native;

    fn from_native(native: Self::Native) -> PrimitiveResult<Self>;

    /// Build a value from an instance, a native value, or text.
    fn create<'a>(source: impl Into<Source<'a, Self>>) -> PrimitiveResult<Self> {
        match source.into() {
            Source::Value(value) => Ok(value),
            Source::Native(native) => Self::from_native(native),
            Source::Text(text) => text.parse(),
        }
    }
}

/// Wires the `Source` conversions and string-based serde for a codec.
macro_rules! edm_primitive_glue {
    ($edm:ty, $native:ty) => {
        impl<'a> From<$edm> for $crate::primitives::Source<'a, $edm> {
            fn from(value: $edm) -> Self {
                $crate::primitives::Source::Value(value)
            }
        }

        impl<'a> From<&'a $edm> for $crate::primitives::Source<'a, $edm> {
            fn from(value: &'a $edm) -> Self {
                $crate::primitives::Source::Value(value.clone())
            }
        }

        impl<'a> From<$native> for $crate::primitives::Source<'a, $edm> {
            fn from(native: $native) -> Self {
                $crate::primitives::Source::Native(native)
            }
        }

        impl<'a> From<&'a str> for $crate::primitives::Source<'a, $edm> {
            fn from(text: &'a str) -> Self {
                $crate::primitives::Source::Text(text)
            }
        }

        impl<'a> From<&'a String> for $crate::primitives::Source<'a, $edm> {
            fn from(text: &'a String) -> Self {
                $crate::primitives::Source::Text(text.as_str())
            }
        }

        impl serde::Serialize for $edm {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $edm {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                text.parse::<$edm>().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use edm_primitive_glue;

pub mod date;
pub mod date_time_offset;
pub mod duration;
pub mod offset;
pub mod time_of_day;

pub use date::EdmDate;
pub use date_time_offset::EdmDateTimeOffset;
pub use duration::EdmDuration;
pub use offset::EdmOffset;
pub use time_of_day::EdmTimeOfDay;

/// Parse up to 12 fractional digits into picoseconds.
pub(crate) fn parse_fraction(digits: &str) -> Option<u64> {
    if digits.is_empty() || digits.len() > MAX_FRACTION_DIGITS {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let scale = 10u64.pow((MAX_FRACTION_DIGITS - digits.len()) as u32);
    Some(value * scale)
}

/// Render picoseconds as `.ddd` with trailing zeros removed; empty for zero.
pub(crate) fn format_fraction(picoseconds: u64) -> String {
    if picoseconds == 0 {
        return String::new();
    }
    let digits = format!("{:012}", picoseconds);
    format!(".{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_scales_to_picoseconds() {
        assert_eq!(parse_fraction("5"), Some(500_000_000_000));
        assert_eq!(parse_fraction("000000000001"), Some(1));
        assert_eq!(parse_fraction("0000000000001"), None);
        assert_eq!(parse_fraction(""), None);
    }

    #[test]
    fn fraction_renders_trimmed() {
        assert_eq!(format_fraction(0), "");
        assert_eq!(format_fraction(500_000_000_000), ".5");
        assert_eq!(format_fraction(123_000_000), ".000123");
    }
}
