//! `Edm.Duration` (ISO 8601 day-time duration, `-P1DT2H30M5.5S`)

use super::{
    EdmPrimitive, PrimitiveError, PrimitiveResult, edm_primitive_glue, format_fraction,
    parse_fraction,
};
use chrono::TimeDelta;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static RE_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d+))?S)?)?$")
        .expect("Invalid regex")
});

const SECONDS_PER_DAY: u64 = 86_400;

/// Signed day-time duration.
///
/// The magnitude is kept as canonical total seconds plus a picosecond
/// fraction; days/hours/minutes/seconds are derived from it, so `PT120M` and
/// `PT2H` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EdmDuration {
    negative: bool,
    total_seconds: u64,
    picoseconds: u64,
}

impl EdmDuration {
    pub const ZERO: EdmDuration = EdmDuration {
        negative: false,
        total_seconds: 0,
        picoseconds: 0,
    };

    fn from_magnitude(negative: bool, total_seconds: u64, picoseconds: u64) -> Self {
        let is_zero = total_seconds == 0 && picoseconds == 0;
        Self {
            negative: negative && !is_zero,
            total_seconds,
            picoseconds,
        }
    }

    /// Build a duration from signed whole seconds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::EdmDuration;
    ///
    /// assert_eq!(EdmDuration::from_seconds(93_600).to_string(), "P1DT2H");
    /// assert_eq!(EdmDuration::from_seconds(-1200).to_string(), "-PT20M");
    /// ```
    pub fn from_seconds(seconds: i64) -> Self {
        Self::from_magnitude(seconds < 0, seconds.unsigned_abs(), 0)
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Signed canonical total of whole seconds
    pub fn total_seconds(&self) -> i128 {
        let magnitude = self.total_seconds as i128;
        if self.negative { -magnitude } else { magnitude }
    }

    pub fn days(&self) -> u64 {
        self.total_seconds / SECONDS_PER_DAY
    }

    pub fn hours(&self) -> u64 {
        (self.total_seconds % SECONDS_PER_DAY) / 3600
    }

    pub fn minutes(&self) -> u64 {
        (self.total_seconds % 3600) / 60
    }

    pub fn seconds(&self) -> u64 {
        self.total_seconds % 60
    }

    /// Fractional part of the seconds component, in picoseconds
    pub fn picoseconds(&self) -> u64 {
        self.picoseconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds == 0 && self.picoseconds == 0
    }

    pub fn to_time_delta(&self) -> Option<TimeDelta> {
        let seconds = i64::try_from(self.total_seconds).ok()?;
        let nanos = (self.picoseconds / 1000) as u32;
        let magnitude = TimeDelta::new(seconds, nanos)?;
        Some(if self.negative { -magnitude } else { magnitude })
    }
}

impl FromStr for EdmDuration {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RE_DURATION.captures(s).ok_or_else(|| {
            PrimitiveError::new(s, Self::TYPE_NAME, "expected (-)P[nD][T[nH][nM][n[.f]S]]")
        })?;
        let has_date_part = caps.get(2).is_some();
        let has_time_part = caps.get(3).is_some() || caps.get(4).is_some() || caps.get(5).is_some();
        if !has_date_part && !has_time_part {
            return Err(PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                "duration needs at least one component",
            ));
        }
        if s.contains('T') && !has_time_part {
            return Err(PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                "'T' must be followed by a time component",
            ));
        }

        let overflow = || PrimitiveError::new(s, Self::TYPE_NAME, "duration overflows");
        let component = |idx: usize, unit: u64| -> Result<u64, PrimitiveError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .ok()
                    .and_then(|n| n.checked_mul(unit))
                    .ok_or_else(overflow),
                None => Ok(0),
            }
        };

        let total = [
            component(2, SECONDS_PER_DAY)?,
            component(3, 3600)?,
            component(4, 60)?,
            component(5, 1)?,
        ]
        .into_iter()
        .try_fold(0u64, |acc, part| acc.checked_add(part))
        .ok_or_else(overflow)?;

        let picoseconds = match caps.get(6) {
            Some(digits) => parse_fraction(digits.as_str()).ok_or_else(|| {
                PrimitiveError::new(
                    s,
                    Self::TYPE_NAME,
                    "fractional seconds allow at most 12 digits",
                )
            })?,
            None => 0,
        };

        Ok(Self::from_magnitude(caps.get(1).is_some(), total, picoseconds))
    }
}

impl fmt::Display for EdmDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "P0D");
        }
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        out.push('P');
        if self.days() > 0 {
            out.push_str(&format!("{}D", self.days()));
        }
        let mut time = String::new();
        if self.hours() > 0 {
            time.push_str(&format!("{}H", self.hours()));
        }
        if self.minutes() > 0 {
            time.push_str(&format!("{}M", self.minutes()));
        }
        if self.seconds() > 0 || self.picoseconds > 0 {
            time.push_str(&format!(
                "{}{}S",
                self.seconds(),
                format_fraction(self.picoseconds)
            ));
        }
        if !time.is_empty() {
            out.push('T');
            out.push_str(&time);
        }
        f.write_str(&out)
    }
}

impl EdmPrimitive for EdmDuration {
    const TYPE_NAME: &'static str = "Edm.Duration";
    type Native = TimeDelta;

    fn from_native(native: TimeDelta) -> PrimitiveResult<Self> {
        let seconds = native.num_seconds();
        let nanos = native.subsec_nanos();
        let negative = seconds < 0 || nanos < 0;
        Ok(Self::from_magnitude(
            negative,
            seconds.unsigned_abs(),
            nanos.unsigned_abs() as u64 * 1000,
        ))
    }
}

edm_primitive_glue!(EdmDuration, TimeDelta);
