//! `Edm.TimeOfDay` (`hh:mm[:ss[.fffffffffffff]]`)

use super::{
    EdmPrimitive, PICOS_PER_SECOND, PrimitiveError, PrimitiveResult, edm_primitive_glue,
    format_fraction, parse_fraction,
};
use chrono::{NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static RE_TIME_OF_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?$").expect("Invalid regex")
});

const SECONDS_PER_DAY: i64 = 86_400;

/// Time of day with picosecond precision.
///
/// Whole seconds and the fractional part are kept apart so a 12-digit
/// fraction survives a round trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EdmTimeOfDay {
    hours: u32,
    minutes: u32,
    seconds: u32,
    picoseconds: u64,
}

impl EdmTimeOfDay {
    pub const MIDNIGHT: EdmTimeOfDay = EdmTimeOfDay::from_parts_unchecked(0, 0, 0, 0);

    pub(crate) const fn from_parts_unchecked(
        hours: u32,
        minutes: u32,
        seconds: u32,
        picoseconds: u64,
    ) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            picoseconds,
        }
    }

    /// Build a time of day, normalizing overflowing minutes/seconds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::EdmTimeOfDay;
    ///
    /// let time = EdmTimeOfDay::new(10, 75, 0).unwrap();
    /// assert_eq!(time.to_string(), "11:15:00");
    /// assert!(EdmTimeOfDay::new(24, 0, 0).is_err());
    /// ```
    pub fn new(hours: i64, minutes: i64, seconds: i64) -> PrimitiveResult<Self> {
        Self::normalized(hours, minutes, seconds, 0)
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Fractional part of the second, in picoseconds
    pub fn picoseconds(&self) -> u64 {
        self.picoseconds
    }

    /// Fractional part of the second as a float (lossy above nanoseconds)
    pub fn fractional_seconds(&self) -> f64 {
        self.picoseconds as f64 / PICOS_PER_SECOND as f64
    }

    /// Whole seconds since midnight
    pub fn total_seconds(&self) -> u32 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    pub fn with_hours(&self, hours: i64) -> PrimitiveResult<Self> {
        Self::normalized(
            hours,
            self.minutes as i64,
            self.seconds as i64,
            self.picoseconds,
        )
    }

    pub fn with_minutes(&self, minutes: i64) -> PrimitiveResult<Self> {
        Self::normalized(
            self.hours as i64,
            minutes,
            self.seconds as i64,
            self.picoseconds,
        )
    }

    pub fn with_seconds(&self, seconds: i64) -> PrimitiveResult<Self> {
        Self::normalized(
            self.hours as i64,
            self.minutes as i64,
            seconds,
            self.picoseconds,
        )
    }

    pub fn with_picoseconds(&self, picoseconds: u64) -> PrimitiveResult<Self> {
        if picoseconds >= PICOS_PER_SECOND {
            return Err(PrimitiveError::new(
                picoseconds.to_string(),
                Self::TYPE_NAME,
                "fractional seconds must be below one second",
            ));
        }
        Ok(Self {
            picoseconds,
            ..*self
        })
    }

    fn normalized(
        hours: i64,
        minutes: i64,
        seconds: i64,
        picoseconds: u64,
    ) -> PrimitiveResult<Self> {
        let total = hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .ok_or_else(|| {
                PrimitiveError::new(
                    format!("{}:{}:{}", hours, minutes, seconds),
                    Self::TYPE_NAME,
                    "component overflow",
                )
            })?;
        if !(0..SECONDS_PER_DAY).contains(&total) {
            return Err(PrimitiveError::new(
                render_total(total, picoseconds),
                Self::TYPE_NAME,
                "time of day must be within [00:00:00, 24:00:00)",
            ));
        }
        Ok(Self {
            hours: (total / 3600) as u32,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
            picoseconds,
        })
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let nanos = (self.picoseconds / 1000) as u32;
        NaiveTime::from_hms_nano_opt(self.hours, self.minutes, self.seconds, nanos)
    }
}

/// Render a possibly out-of-range total for error messages.
fn render_total(total: i64, picoseconds: u64) -> String {
    let sign = if total < 0 { "-" } else { "" };
    let magnitude = total.unsigned_abs();
    format!(
        "{}{:02}:{:02}:{:02}{}",
        sign,
        magnitude / 3600,
        (magnitude % 3600) / 60,
        magnitude % 60,
        format_fraction(picoseconds)
    )
}

impl FromStr for EdmTimeOfDay {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RE_TIME_OF_DAY.captures(s).ok_or_else(|| {
            PrimitiveError::new(s, Self::TYPE_NAME, "expected hh:mm[:ss[.fraction]]")
        })?;
        let component = |idx: usize| -> u32 {
            caps.get(idx)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let (hours, minutes, seconds) = (component(1), component(2), component(3));
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                "component out of range",
            ));
        }
        let picoseconds = match caps.get(4) {
            Some(digits) => parse_fraction(digits.as_str()).ok_or_else(|| {
                PrimitiveError::new(
                    s,
                    Self::TYPE_NAME,
                    "fractional seconds allow at most 12 digits",
                )
            })?,
            None => 0,
        };
        Ok(Self {
            hours,
            minutes,
            seconds,
            picoseconds,
        })
    }
}

impl fmt::Display for EdmTimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}{}",
            self.hours,
            self.minutes,
            self.seconds,
            format_fraction(self.picoseconds)
        )
    }
}

impl EdmPrimitive for EdmTimeOfDay {
    const TYPE_NAME: &'static str = "Edm.TimeOfDay";
    type Native = NaiveTime;

    fn from_native(native: NaiveTime) -> PrimitiveResult<Self> {
        let nanos = native.nanosecond();
        if nanos >= 1_000_000_000 {
            return Err(PrimitiveError::new(
                native.to_string(),
                Self::TYPE_NAME,
                "leap seconds are not representable",
            ));
        }
        Ok(Self {
            hours: native.hour(),
            minutes: native.minute(),
            seconds: native.second(),
            picoseconds: nanos as u64 * 1000,
        })
    }
}

edm_primitive_glue!(EdmTimeOfDay, NaiveTime);
