//! `Edm.Date` (`(-)YYYY-MM-DD`, proleptic Gregorian, unbounded year)

use super::{EdmPrimitive, PrimitiveError, PrimitiveResult, edm_primitive_glue};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?)(\d{4,})-(\d{2})-(\d{2})$").expect("Invalid regex"));

/// Calendar date with an arbitrary, possibly negative, year.
///
/// Years 0 through 99 are kept literally; there is no two-digit-year shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdmDate {
    year: i64,
    month: u32,
    day: u32,
}

impl Default for EdmDate {
    fn default() -> Self {
        Self::from_parts_unchecked(1970, 1, 1)
    }
}

impl EdmDate {
    pub(crate) const fn from_parts_unchecked(year: i64, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Build a date from exact components.
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::EdmDate;
    ///
    /// assert!(EdmDate::new(2024, 2, 29).is_ok());
    /// assert!(EdmDate::new(2023, 2, 29).is_err());
    /// ```
    pub fn new(year: i64, month: u32, day: u32) -> PrimitiveResult<Self> {
        let candidate = Self { year, month, day };
        if !(1..=12).contains(&month) {
            return Err(PrimitiveError::new(
                candidate.to_string(),
                Self::TYPE_NAME,
                "month must be within 1..=12",
            ));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(PrimitiveError::new(
                candidate.to_string(),
                Self::TYPE_NAME,
                "day does not exist in month",
            ));
        }
        Ok(candidate)
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Same month and day in another year; Feb 29 rolls to Mar 1 when needed.
    pub fn with_year(&self, year: i64) -> PrimitiveResult<Self> {
        Self::normalized(year as i128, self.month as i128, self.day as i128)
    }

    /// Set the month with calendar carry (13 is January of the next year).
    ///
    /// # Example
    ///
    /// ```rust
    /// use odata_metadata_sdk::primitives::{EdmDate, EdmPrimitive};
    ///
    /// let date = EdmDate::create("2023-05-10").unwrap();
    /// assert_eq!(date.with_month(13).unwrap().to_string(), "2024-01-10");
    /// assert_eq!(date.with_month(0).unwrap().to_string(), "2022-12-10");
    /// ```
    pub fn with_month(&self, month: i64) -> PrimitiveResult<Self> {
        Self::normalized(self.year as i128, month as i128, self.day as i128)
    }

    /// Set the day with calendar carry (day 0 is the last day of the previous month).
    pub fn with_day(&self, day: i64) -> PrimitiveResult<Self> {
        Self::normalized(self.year as i128, self.month as i128, day as i128)
    }

    /// Days since 1970-01-01
    pub fn days_since_epoch(&self) -> i128 {
        days_from_civil(self.year as i128, self.month as i128, self.day as i128)
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let year = i32::try_from(self.year).ok()?;
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    fn normalized(year: i128, month: i128, day: i128) -> PrimitiveResult<Self> {
        let months = year * 12 + (month - 1);
        let year = months.div_euclid(12);
        let month = months.rem_euclid(12) + 1;
        let days = days_from_civil(year, month, 1) + (day - 1);
        let (year, month, day) = civil_from_days(days);
        let year = i64::try_from(year).map_err(|_| {
            PrimitiveError::new(
                format!("{year}-{month:02}-{day:02}"),
                Self::TYPE_NAME,
                "year out of range",
            )
        })?;
        Ok(Self {
            year,
            month: month as u32,
            day: day as u32,
        })
    }
}

pub(crate) fn is_leap_year(year: i64) -> bool {
    let year = year as i128;
    year.rem_euclid(4) == 0 && (year.rem_euclid(100) != 0 || year.rem_euclid(400) == 0)
}

pub(crate) fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
pub(crate) fn days_from_civil(year: i128, month: i128, day: i128) -> i128 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let shifted_month = (month + 9) % 12;
    let day_of_year = (153 * shifted_month + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

/// Inverse of [`days_from_civil`].
pub(crate) fn civil_from_days(days: i128) -> (i128, i128, i128) {
    let days = days + 719_468;
    let era = days.div_euclid(146_097);
    let day_of_era = days - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    let year = year_of_era + era * 400;
    (if month <= 2 { year + 1 } else { year }, month, day)
}

impl FromStr for EdmDate {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RE_DATE
            .captures(s)
            .ok_or_else(|| PrimitiveError::new(s, Self::TYPE_NAME, "expected (-)YYYY-MM-DD"))?;
        let negative = !caps[1].is_empty();
        let year_digits = &caps[2];
        if year_digits.len() > 4 && year_digits.starts_with('0') {
            return Err(PrimitiveError::new(
                s,
                Self::TYPE_NAME,
                "years beyond four digits must not have leading zeros",
            ));
        }
        let magnitude: i64 = year_digits
            .parse()
            .map_err(|_| PrimitiveError::new(s, Self::TYPE_NAME, "year out of range"))?;
        if negative && magnitude == 0 {
            return Err(PrimitiveError::new(s, Self::TYPE_NAME, "year -0000 is not allowed"));
        }
        let year = if negative { -magnitude } else { magnitude };
        let month: u32 = caps[3]
            .parse()
            .map_err(|_| PrimitiveError::new(s, Self::TYPE_NAME, "invalid month"))?;
        let day: u32 = caps[4]
            .parse()
            .map_err(|_| PrimitiveError::new(s, Self::TYPE_NAME, "invalid day"))?;
        Self::new(year, month, day).map_err(|e| PrimitiveError::new(s, Self::TYPE_NAME, e.reason))
    }
}

impl fmt::Display for EdmDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.year < 0 { "-" } else { "" };
        write!(
            f,
            "{}{:04}-{:02}-{:02}",
            sign,
            self.year.unsigned_abs(),
            self.month,
            self.day
        )
    }
}

impl EdmPrimitive for EdmDate {
    const TYPE_NAME: &'static str = "Edm.Date";
    type Native = NaiveDate;

    fn from_native(native: NaiveDate) -> PrimitiveResult<Self> {
        Ok(Self {
            year: native.year() as i64,
            month: native.month(),
            day: native.day(),
        })
    }
}

edm_primitive_glue!(EdmDate, NaiveDate);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_negative_years() {
        let date = EdmDate::create("2024-02-29").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));

        let bc = EdmDate::create("-0044-03-15").unwrap();
        assert_eq!(bc.year(), -44);
        assert_eq!(bc.to_string(), "-0044-03-15");

        let far = EdmDate::create("123456-01-01").unwrap();
        assert_eq!(far.year(), 123_456);
    }

    #[test]
    fn two_digit_years_are_literal() {
        let date = EdmDate::create("0050-06-01").unwrap();
        assert_eq!(date.year(), 50);
        assert_eq!(date.to_string(), "0050-06-01");
        assert_eq!(date.with_month(7).unwrap().year(), 50);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(EdmDate::create("2023-02-29").is_err());
        assert!(EdmDate::create("2023-13-01").is_err());
        assert!(EdmDate::create("23-01-01").is_err());
        assert!(EdmDate::create("01234-01-01").is_err());
        assert!(EdmDate::create("-0000-01-01").is_err());
    }

    #[test]
    fn month_and_day_setters_normalize() {
        let date = EdmDate::create("2023-01-31").unwrap();
        assert_eq!(date.with_day(32).unwrap().to_string(), "2023-02-01");
        assert_eq!(date.with_day(0).unwrap().to_string(), "2022-12-31");
        assert_eq!(date.with_month(2).unwrap().to_string(), "2023-03-03");
        assert_eq!(date.with_month(-1).unwrap().to_string(), "2022-12-01");
    }

    #[test]
    fn carry_past_the_largest_year_is_an_error() {
        let last = EdmDate::create("2023-12-31").unwrap().with_year(i64::MAX).unwrap();
        assert_eq!(last.year(), i64::MAX);

        let err = last.with_day(32).unwrap_err();
        assert_eq!(err.type_name, "Edm.Date");
        assert_eq!(err.reason, "year out of range");
        assert!(last.with_month(13).is_err());
        assert!(last.with_month(12).is_ok());
    }

    #[test]
    fn leap_year_rolls_forward_on_year_change() {
        let date = EdmDate::create("2024-02-29").unwrap();
        assert_eq!(date.with_year(2023).unwrap().to_string(), "2023-03-01");
        assert_eq!(date.with_year(2000).unwrap().to_string(), "2000-02-29");
    }

    #[test]
    fn civil_day_arithmetic_round_trips() {
        for days in [-800_000i128, -1, 0, 1, 59, 365, 11_016, 2_932_896] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(days_from_civil(1970, 1, 1), 0);
    }

    #[test]
    fn converts_from_naive_date() {
        let native = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let date = EdmDate::create(native).unwrap();
        assert_eq!(date.to_string(), "1999-12-31");
        assert_eq!(date.to_naive_date(), Some(native));
    }
}
