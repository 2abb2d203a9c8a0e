// Time Converter - Calendar <-> Julian Date mapping
// Every propagation in the engine is anchored to one continuous day count.
// Uniform days throughout: leap seconds are not modelled.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::kepler_solver::normalize_angle;

// =============================================================================
// TIME CONSTANTS
// =============================================================================

/// J2000.0 epoch (2000-01-01 12:00 TT) as a Julian Date
pub const J2000_JD: f64 = 2451545.0;

/// Julian Date of the Unix epoch (1970-01-01 00:00 UTC)
pub const UNIX_EPOCH_JD: f64 = 2440587.5;

pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Integer day number of 1582-10-15, the first Gregorian calendar day
const GREGORIAN_START_DAY: i64 = 2299161;

pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;

// =============================================================================
// CALENDAR INSTANT
// =============================================================================

/// Civil date and time of day, resolved to whole seconds.
/// Dates before 1582-10-15 are read in the Julian calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarInstant {
    pub year: i32,
    pub month: u32, // 1-12
    pub day: u32,   // 1-31
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CalendarInstant {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Midnight at the start of the given date
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Truncates sub-second precision.
    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self::new(
            datetime.year(),
            datetime.month(),
            datetime.day(),
            datetime.hour(),
            datetime.minute(),
            datetime.second(),
        )
    }

    fn is_gregorian(&self) -> bool {
        (self.year, self.month, self.day) >= (1582, 10, 15)
    }

    fn day_fraction(&self) -> f64 {
        (self.hour as f64 * 3600.0 + self.minute as f64 * 60.0 + self.second as f64)
            / SECONDS_PER_DAY
    }
}

// =============================================================================
// JULIAN DATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct JulianDate(pub f64);

impl JulianDate {
    pub const J2000: JulianDate = JulianDate(J2000_JD);

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn add_days(&self, days: f64) -> Self {
        JulianDate(self.0 + days)
    }

    pub fn days_since(&self, epoch: JulianDate) -> f64 {
        self.0 - epoch.0
    }

    pub fn centuries_since(&self, epoch: JulianDate) -> f64 {
        centuries_since_epoch(*self, epoch)
    }
}

/// Gregorian/Julian calendar date to Julian Date (Meeus, Astronomical Algorithms ch. 7)
pub fn to_julian_date(instant: &CalendarInstant) -> JulianDate {
    let mut year = instant.year as f64;
    let mut month = instant.month as f64;

    // January and February count as months 13 and 14 of the previous year
    if instant.month <= 2 {
        year -= 1.0;
        month += 12.0;
    }

    let b = if instant.is_gregorian() {
        let a = (year / 100.0).floor();
        2.0 - a + (a / 4.0).floor()
    } else {
        0.0
    };

    let jd = (365.25 * (year + 4716.0)).floor()
        + (30.6001 * (month + 1.0)).floor()
        + instant.day as f64
        + instant.day_fraction()
        + b
        - 1524.5;

    JulianDate(jd)
}

/// Inverse of `to_julian_date`, rounded to the nearest whole second
pub fn from_julian_date(jd: JulianDate) -> CalendarInstant {
    // Round before splitting the day so 23:59:59.7 carries into the next date
    let total_seconds = ((jd.0 + 0.5) * SECONDS_PER_DAY).round() as i64;
    let z = total_seconds.div_euclid(SECONDS_PER_DAY as i64);
    let seconds_of_day = total_seconds.rem_euclid(SECONDS_PER_DAY as i64);

    let a = if z < GREGORIAN_START_DAY {
        z
    } else {
        let alpha = ((z as f64 - 1867216.25) / 36524.25).floor() as i64;
        z + 1 + alpha - alpha.div_euclid(4)
    };

    let b = a + 1524;
    let c = ((b as f64 - 122.1) / 365.25).floor() as i64;
    let d = (365.25 * c as f64).floor() as i64;
    let e = ((b - d) as f64 / 30.6001).floor() as i64;

    let day = b - d - (30.6001 * e as f64).floor() as i64;
    let month = if e < 14 { e - 1 } else { e - 13 };
    let year = if month > 2 { c - 4716 } else { c - 4715 };

    CalendarInstant {
        year: year as i32,
        month: month as u32,
        day: day as u32,
        hour: (seconds_of_day / 3600) as u32,
        minute: ((seconds_of_day % 3600) / 60) as u32,
        second: (seconds_of_day % 60) as u32,
    }
}

pub fn centuries_since_epoch(jd: JulianDate, epoch: JulianDate) -> f64 {
    (jd.0 - epoch.0) / DAYS_PER_JULIAN_CENTURY
}

// =============================================================================
// CHRONO INTEROP
// =============================================================================

pub fn julian_date_from_datetime(datetime: &DateTime<Utc>) -> JulianDate {
    let seconds =
        datetime.timestamp() as f64 + datetime.timestamp_subsec_nanos() as f64 * 1e-9;
    JulianDate(UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY)
}

/// Millisecond resolution; `None` outside chrono's representable range
pub fn datetime_from_julian_date(jd: JulianDate) -> Option<DateTime<Utc>> {
    let millis = ((jd.0 - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
}

/// Greenwich Mean Sidereal Time in radians, [0, 2π)
pub fn greenwich_mean_sidereal_time(jd: JulianDate) -> f64 {
    let days = jd.days_since(JulianDate::J2000);
    let centuries = days / DAYS_PER_JULIAN_CENTURY;
    let gmst_degrees = GMST_BASE_DEG
        + GMST_ROTATION_PER_DAY * days
        + GMST_CORRECTION * centuries * centuries
        - centuries * centuries * centuries / 38710000.0;
    normalize_angle(gmst_degrees.to_radians())
}

// =============================================================================
// TESTS
// =============================================================================
