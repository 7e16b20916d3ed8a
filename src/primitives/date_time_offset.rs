//! `Edm.DateTimeOffset` (`date "T" time offset`)

use super::{
    EdmDate, EdmOffset, EdmPrimitive, EdmTimeOfDay, PrimitiveError, PrimitiveResult,
    edm_primitive_glue,
};
use chrono::{DateTime, FixedOffset, TimeZone};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Date, time of day and offset, composed strictly from the three codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdmDateTimeOffset {
    date: EdmDate,
    time: EdmTimeOfDay,
    offset: EdmOffset,
}

impl EdmDateTimeOffset {
    /// Earliest representable instant
    pub const MIN_VALUE: EdmDateTimeOffset = EdmDateTimeOffset {
        date: EdmDate::from_parts_unchecked(1, 1, 1),
        time: EdmTimeOfDay::MIDNIGHT,
        offset: EdmOffset::UTC,
    };

    /// Latest representable instant
    pub const MAX_VALUE: EdmDateTimeOffset = EdmDateTimeOffset {
        date: EdmDate::from_parts_unchecked(9999, 12, 31),
        time: EdmTimeOfDay::from_parts_unchecked(23, 59, 59, 999_999_999_999),
        offset: EdmOffset::UTC,
    };

    /// Compose a value, rejecting instants outside `MIN_VALUE..=MAX_VALUE`.
    pub fn new(date: EdmDate, time: EdmTimeOfDay, offset: EdmOffset) -> PrimitiveResult<Self> {
        let candidate = Self { date, time, offset };
        if candidate.cmp_instant(&Self::MIN_VALUE) == Ordering::Less
            || candidate.cmp_instant(&Self::MAX_VALUE) == Ordering::Greater
        {
            return Err(PrimitiveError::new(
                candidate.to_string(),
                Self::TYPE_NAME,
                "outside the representable range",
            ));
        }
        Ok(candidate)
    }

    pub fn date(&self) -> &EdmDate {
        &self.date
    }

    pub fn time(&self) -> &EdmTimeOfDay {
        &self.time
    }

    pub fn offset(&self) -> &EdmOffset {
        &self.offset
    }

    /// Seconds since the Unix epoch (UTC) plus the picosecond fraction.
    fn instant(&self) -> (i128, u64) {
        let seconds = self.date.days_since_epoch() * 86_400 + self.time.total_seconds() as i128
            - self.offset.total_minutes() as i128 * 60;
        (seconds, self.time.picoseconds())
    }

    /// Compare the instants two values denote, ignoring how the offset is written.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::{EdmDateTimeOffset, EdmPrimitive};
    /// use std::cmp::Ordering;
    ///
    /// let utc = EdmDateTimeOffset::create("2024-01-01T12:00:00Z").unwrap();
    /// let cet = EdmDateTimeOffset::create("2024-01-01T13:00:00+01:00").unwrap();
    /// assert_eq!(utc.cmp_instant(&cet), Ordering::Equal);
    /// assert_ne!(utc, cet);
    /// ```
    pub fn cmp_instant(&self, other: &Self) -> Ordering {
        self.instant().cmp(&other.instant())
    }

    pub fn to_chrono(&self) -> Option<DateTime<FixedOffset>> {
        let naive = self.date.to_naive_date()?.and_time(self.time.to_naive_time()?);
        self.offset
            .to_fixed_offset()
            .from_local_datetime(&naive)
            .single()
    }
}

impl FromStr for EdmDateTimeOffset {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wrap = |e: PrimitiveError| {
            PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                format!("{} '{}': {}", e.type_name, e.input, e.reason),
            )
        };
        let (date_part, rest) = s
            .split_once('T')
            .ok_or_else(|| PrimitiveError::new(s, Self::TYPE_NAME, "missing 'T' separator"))?;
        let offset_start = if rest.ends_with('Z') {
            rest.len() - 1
        } else {
            rest.rfind(['+', '-']).ok_or_else(|| {
                PrimitiveError::new(s, Self::TYPE_NAME, "missing time-zone offset")
            })?
        };
        let (time_part, offset_part) = rest.split_at(offset_start);

        let date: EdmDate = date_part.parse().map_err(wrap)?;
        let time: EdmTimeOfDay = time_part.parse().map_err(wrap)?;
        let offset: EdmOffset = offset_part.parse().map_err(wrap)?;
        Self::new(date, time, offset).map_err(|e| PrimitiveError::new(s, Self::TYPE_NAME, e.reason))
    }
}

impl fmt::Display for EdmDateTimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}{}", self.date, self.time, self.offset)
    }
}

impl EdmPrimitive for EdmDateTimeOffset {
    const TYPE_NAME: &'static str = "Edm.DateTimeOffset";
    type Native = DateTime<FixedOffset>;

    fn from_native(native: DateTime<FixedOffset>) -> PrimitiveResult<Self> {
        let date = EdmDate::from_native(native.date_naive())?;
        let time = EdmTimeOfDay::from_native(native.time())?;
        let offset = EdmOffset::from_native(*native.offset())?;
        Self::new(date, time, offset)
    }
}

edm_primitive_glue!(EdmDateTimeOffset, DateTime<FixedOffset>);
