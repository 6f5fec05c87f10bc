//! GPS time to calendar conversion
//!
//! The sonde reports time as a GPS week number and a
//! time-of-week in milliseconds. Calendar dates are computed
//! through the Modified Julian Day using only integer
//! arithmetic. UTC leap seconds are ignored: all times are in
//! the GPS time scale.

use std::fmt;

#[cfg(feature = "chrono")]
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use strum::EnumMessage;

/// Modified Julian Day of the GPS epoch, 1980-01-06
pub const GPS_EPOCH_MJD: i64 = 44244;

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Day of the GPS week
///
/// GPS weeks begin on Sunday.
///
/// ```
/// use rd94::Weekday;
///
/// assert_eq!(Some(Weekday::Sunday), Weekday::from_repr(0));
/// assert_eq!("Sun", Weekday::Sunday.as_str());
/// assert_eq!("Sunday", Weekday::Sunday.as_display_str());
/// assert_eq!(None, Weekday::from_repr(7));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumMessage,
    strum_macros::EnumIter,
    strum_macros::FromRepr,
)]
#[repr(u8)]
pub enum Weekday {
    #[strum(serialize = "Sun", detailed_message = "Sunday")]
    Sunday = 0,
    #[strum(serialize = "Mon", detailed_message = "Monday")]
    Monday = 1,
    #[strum(serialize = "Tue", detailed_message = "Tuesday")]
    Tuesday = 2,
    #[strum(serialize = "Wed", detailed_message = "Wednesday")]
    Wednesday = 3,
    #[strum(serialize = "Thu", detailed_message = "Thursday")]
    Thursday = 4,
    #[strum(serialize = "Fri", detailed_message = "Friday")]
    Friday = 5,
    #[strum(serialize = "Sat", detailed_message = "Saturday")]
    Saturday = 6,
}

impl Weekday {
    /// Three-letter abbreviation, like "`Sun`"
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Full name, like "`Sunday`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }
}

impl AsRef<str> for Weekday {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gregorian calendar date
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hour, self.minute, self.second, self.millisecond
        )
    }
}

/// GPS week and time-of-week
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpsTime {
    week: i32,
    tow_ms: i32,
}

impl GpsTime {
    /// GPS time from `week` and time-of-week `tow_ms` (milliseconds)
    pub fn new(week: i32, tow_ms: i32) -> Self {
        Self { week, tow_ms }
    }

    /// GPS week number
    pub fn week(&self) -> i32 {
        self.week
    }

    /// Time of week (ms)
    pub fn tow_ms(&self) -> i32 {
        self.tow_ms
    }

    /// Whole seconds since the start of the week
    pub fn seconds_of_week(&self) -> i32 {
        self.tow_ms.div_euclid(1000)
    }

    /// Day index within the week
    ///
    /// `0` is Sunday. Values outside `0..=6` indicate a corrupt
    /// time-of-week.
    pub fn day_index(&self) -> i32 {
        self.seconds_of_week().div_euclid(SECONDS_PER_DAY as i32)
    }

    /// Day of the week, if the time-of-week is in range
    pub fn weekday(&self) -> Option<Weekday> {
        u8::try_from(self.day_index())
            .ok()
            .and_then(Weekday::from_repr)
    }

    /// Time of day
    pub fn time_of_day(&self) -> TimeOfDay {
        let secs = self.seconds_of_week().rem_euclid(SECONDS_PER_DAY as i32);
        TimeOfDay {
            hour: (secs / 3600) as u8,
            minute: ((secs % 3600) / 60) as u8,
            second: (secs % 60) as u8,
            millisecond: self.tow_ms.rem_euclid(1000) as u16,
        }
    }

    /// Calendar date
    pub fn date(&self) -> CalendarDate {
        gps_to_date(self.week as i64, self.seconds_of_week() as i64)
    }

    /// Modified Julian Day
    pub fn mjd(&self) -> i64 {
        gps_to_mjd(self.week as i64, self.seconds_of_week() as i64)
    }

    /// Convert to a chrono timestamp
    ///
    /// The result is in the GPS time scale, which differs from UTC
    /// by the accumulated leap seconds. Returns `None` if the
    /// time-of-week is out of range.
    #[cfg(feature = "chrono")]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.weekday()?;
        let date = self.date();
        let time = self.time_of_day();
        let naive = NaiveDate::from_ymd_opt(date.year, date.month as u32, date.day as u32)?
            .and_hms_milli_opt(
                time.hour as u32,
                time.minute as u32,
                time.second as u32,
                time.millisecond as u32,
            )?;
        Some(Utc.from_utc_datetime(&naive))
    }
}

/// Modified Julian Day for a GPS week and seconds-of-week
pub fn gps_to_mjd(week: i64, seconds: i64) -> i64 {
    GPS_EPOCH_MJD + week * 7 + seconds / SECONDS_PER_DAY
}

/// Convert GPS week and seconds-of-week to a calendar date
///
/// Adapted from the sci.astro FAQ conversion from Modified Julian
/// Day to the Gregorian calendar. Uses only integer arithmetic.
/// Ignores UTC leap seconds.
pub fn gps_to_date(week: i64, seconds: i64) -> CalendarDate {
    let mjd = gps_to_mjd(week, seconds);

    let mut j = mjd + 2468570;
    let c = 4 * j / 146097;
    j -= (146097 * c + 3) / 4;
    let y = 4000 * (j + 1) / 1461001;
    j = j - 1461 * y / 4 + 31;
    let m = 80 * j / 2447;
    let day = j - 2447 * m / 80;
    j = m / 11;
    let month = m + 2 - 12 * j;
    let year = 100 * (c - 49) + y + j;

    CalendarDate {
        year: year as i32,
        month: month as u8,
        day: day as u8,
    }
}
