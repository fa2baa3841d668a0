//! OA serial date/time conversion
//!
//! Dates are stored in the package as day counts from an epoch, with the
//! time of day as the fractional part. In the 1900 system the format keeps
//! the historical "1900 is a leap year" bug, so serials before 1900-03-01
//! are one day off from a plain day count.
//!
//! All functions are pure and take the date system explicitly.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Smallest serial the reader turns into a date
pub const MIN_OADATE_VALUE: f64 = 0.0;

/// Largest serial the reader turns into a date (9999-12-31 23:59:59)
pub const MAX_OADATE_VALUE: f64 = 2_958_465.999_988_425_9;

/// Largest serial the reader turns into a time of day (23:59:59)
pub const MAX_OATIME_VALUE: f64 = 0.999_988_425_925_926;

/// First serial after the fictional 1900-02-29
const LEAP_BUG_SERIAL: f64 = 61.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn epoch(date_1904: bool) -> NaiveDateTime {
    let (y, m, d) = if date_1904 { (1904, 1, 1) } else { (1899, 12, 30) };
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Earliest date that can be stored in the given date system
pub fn first_valid_date(date_1904: bool) -> NaiveDateTime {
    let year = if date_1904 { 1904 } else { 1900 };
    NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Latest date that can be stored (9999-12-31 23:59:59)
pub fn last_valid_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Convert a date to its OA serial
///
/// Fails with a range error for dates outside
/// [`first_valid_date`]..=[`last_valid_date`].
pub fn date_to_serial(date: NaiveDateTime, date_1904: bool) -> Result<f64> {
    if date < first_valid_date(date_1904) || date > last_valid_date() {
        return Err(Error::out_of_range(format!(
            "date {} cannot be stored as a serial value",
            date
        )));
    }

    let millis = (date - epoch(date_1904)).num_milliseconds() as f64;
    let mut serial = millis / MILLIS_PER_DAY;
    if !date_1904 && serial < LEAP_BUG_SERIAL {
        serial -= 1.0;
    }
    Ok(serial)
}

/// Convert an OA serial back to a date
///
/// Returns `None` when the serial is outside
/// [`MIN_OADATE_VALUE`]..=[`MAX_OADATE_VALUE`]; callers keep such values as
/// plain numbers.
pub fn serial_to_date(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(MIN_OADATE_VALUE..=MAX_OADATE_VALUE).contains(&serial) {
        return None;
    }

    // Serials below the leap-bug point (including pure times below 1.0) are
    // shifted by one day in the 1900 system.
    let adjusted = if !date_1904 && serial < LEAP_BUG_SERIAL {
        serial + 1.0
    } else {
        serial
    };

    let millis = (adjusted * MILLIS_PER_DAY).round() as i64;
    let date = epoch(date_1904).checked_add_signed(Duration::milliseconds(millis))?;
    (date <= last_valid_date()).then_some(date)
}

/// Convert a time of day or duration to its OA serial (fraction of a day)
pub fn time_to_serial(time: Duration) -> Result<f64> {
    if time < Duration::zero() {
        return Err(Error::out_of_range(format!(
            "negative time {} cannot be stored",
            time
        )));
    }
    let serial = time.num_milliseconds() as f64 / MILLIS_PER_DAY;
    if serial > MAX_OADATE_VALUE {
        return Err(Error::out_of_range(format!(
            "time {} exceeds the largest serial value",
            time
        )));
    }
    Ok(serial)
}

/// Convert an OA serial to a time of day
///
/// Returns `None` outside `0.0..=MAX_OATIME_VALUE`.
pub fn serial_to_time(serial: f64) -> Option<Duration> {
    if !serial.is_finite() || !(0.0..=MAX_OATIME_VALUE).contains(&serial) {
        return None;
    }
    Some(Duration::milliseconds((serial * MILLIS_PER_DAY).round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_known_serials() {
        assert_eq!(date_to_serial(dt(1900, 1, 1, 0, 0, 0), false).unwrap(), 1.0);
        assert_eq!(date_to_serial(dt(1900, 2, 28, 0, 0, 0), false).unwrap(), 59.0);
        assert_eq!(date_to_serial(dt(1900, 3, 1, 0, 0, 0), false).unwrap(), 61.0);
        assert_eq!(date_to_serial(dt(2024, 1, 15, 0, 0, 0), false).unwrap(), 45306.0);
        assert_eq!(date_to_serial(dt(2024, 1, 15, 12, 0, 0), false).unwrap(), 45306.5);
    }

    #[test]
    fn test_1904_system() {
        assert_eq!(date_to_serial(dt(1904, 1, 1, 0, 0, 0), true).unwrap(), 0.0);
        assert_eq!(date_to_serial(dt(1904, 1, 2, 6, 0, 0), true).unwrap(), 1.25);
        assert_eq!(serial_to_date(1.25, true), Some(dt(1904, 1, 2, 6, 0, 0)));
        assert!(date_to_serial(dt(1903, 12, 31, 0, 0, 0), true).is_err());
    }

    #[test]
    fn test_date_bounds() {
        assert!(date_to_serial(dt(1899, 12, 31, 23, 59, 59), false).is_err());
        assert!(date_to_serial(dt(9999, 12, 31, 23, 59, 59), false).is_ok());

        let err = date_to_serial(dt(10000, 1, 1, 0, 0, 0), false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Range);
    }

    #[test]
    fn test_serial_round_trip() {
        for date in [
            dt(1900, 1, 1, 0, 0, 0),
            dt(1900, 2, 28, 18, 30, 0),
            dt(1900, 3, 1, 0, 0, 0),
            dt(1999, 12, 31, 23, 59, 59),
            dt(2020, 2, 29, 8, 15, 30),
            dt(9999, 12, 31, 23, 59, 59),
        ] {
            let serial = date_to_serial(date, false).unwrap();
            assert_eq!(serial_to_date(serial, false), Some(date), "serial {}", serial);
        }
    }

    #[test]
    fn test_serial_to_date_rejects_out_of_range() {
        assert_eq!(serial_to_date(-1.0, false), None);
        assert_eq!(serial_to_date(MAX_OADATE_VALUE + 1.0, false), None);
        assert_eq!(serial_to_date(f64::NAN, false), None);
    }

    #[test]
    fn test_fractional_serial_below_one() {
        // A pure time carried with a date format lands on the first day
        assert_eq!(serial_to_date(0.5, false), Some(dt(1899, 12, 31, 12, 0, 0)));
    }

    #[test]
    fn test_time_serials() {
        let t = Duration::hours(6);
        assert_eq!(time_to_serial(t).unwrap(), 0.25);
        assert_eq!(serial_to_time(0.25), Some(t));

        let t = Duration::seconds(13 * 3600 + 45 * 60 + 30);
        assert_eq!(serial_to_time(time_to_serial(t).unwrap()), Some(t));

        assert!(time_to_serial(Duration::seconds(-1)).is_err());
        assert_eq!(serial_to_time(1.5), None);
        assert_eq!(serial_to_time(-0.1), None);
    }
}
