//! `Edm` time-zone offset (`Z`, `+05:30`, `-03:45`)

use super::{EdmPrimitive, PrimitiveError, PrimitiveResult, edm_primitive_glue};
use chrono::{FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static RE_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Z|([+-])(\d{2}):(\d{2}))$").expect("Invalid regex"));

/// UTC offset stored as signed total minutes.
///
/// Offsets are restricted to quarter hours within [-12:00, +14:00].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EdmOffset {
    total_minutes: i32,
}

impl EdmOffset {
    pub const UTC: EdmOffset = EdmOffset { total_minutes: 0 };

    /// Smallest representable offset in minutes (-12:00)
    pub const MIN_MINUTES: i32 = -12 * 60;

    /// Largest representable offset in minutes (+14:00)
    pub const MAX_MINUTES: i32 = 14 * 60;

    /// Build an offset from signed total minutes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::EdmOffset;
    ///
    /// let offset = EdmOffset::from_minutes(-210).unwrap();
    /// assert_eq!(offset.to_string(), "-03:30");
    /// assert!(EdmOffset::from_minutes(-20).is_err());
    /// ```
    pub fn from_minutes(total_minutes: i32) -> PrimitiveResult<Self> {
        let candidate = Self { total_minutes };
        if total_minutes % 15 != 0 {
            return Err(PrimitiveError::new(
                candidate.to_string(),
                Self::TYPE_NAME,
                "minutes must be one of :00, :15, :30 or :45",
            ));
        }
        if !(Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&total_minutes) {
            return Err(PrimitiveError::new(
                candidate.to_string(),
                Self::TYPE_NAME,
                "offset must be within [-12:00, +14:00]",
            ));
        }
        Ok(candidate)
    }

    pub fn total_minutes(&self) -> i32 {
        self.total_minutes
    }

    /// Signed whole hours of the offset
    pub fn hours(&self) -> i32 {
        self.total_minutes / 60
    }

    /// Signed remaining minutes of the offset
    pub fn minutes(&self) -> i32 {
        self.total_minutes % 60
    }

    pub fn is_utc(&self) -> bool {
        self.total_minutes == 0
    }

    pub fn to_fixed_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.total_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl FromStr for EdmOffset {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RE_OFFSET.captures(s).ok_or_else(|| {
            PrimitiveError::new(s, Self::TYPE_NAME, "expected 'Z' or (+|-)hh:mm")
        })?;
        let Some(sign) = caps.get(1) else {
            return Ok(Self::UTC);
        };
        let hours: i32 = caps[2]
            .parse()
            .map_err(|_| PrimitiveError::new(s, Self::TYPE_NAME, "invalid hours"))?;
        let minutes: i32 = caps[3]
            .parse()
            .map_err(|_| PrimitiveError::new(s, Self::TYPE_NAME, "invalid minutes"))?;
        if !matches!(minutes, 0 | 15 | 30 | 45) {
            return Err(PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                "minutes must be one of :00, :15, :30 or :45",
            ));
        }
        let magnitude = hours * 60 + minutes;
        let total = if sign.as_str() == "-" { -magnitude } else { magnitude };
        Self::from_minutes(total).map_err(|e| PrimitiveError::new(s, Self::TYPE_NAME, e.reason))
    }
}

impl fmt::Display for EdmOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_minutes == 0 {
            return write!(f, "Z");
        }
        let sign = if self.total_minutes < 0 { '-' } else { '+' };
        let magnitude = self.total_minutes.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
    }
}

impl EdmPrimitive for EdmOffset {
    const TYPE_NAME: &'static str = "Edm.Offset";
    type Native = FixedOffset;

    fn from_native(native: FixedOffset) -> PrimitiveResult<Self> {
        let seconds = native.local_minus_utc();
        if seconds % 60 != 0 {
            return Err(PrimitiveError::new(
                native.to_string(),
                Self::TYPE_NAME,
                "offset has a seconds component",
            ));
        }
        Self::from_minutes(seconds / 60)
    }
}

edm_primitive_glue!(EdmOffset, FixedOffset);
