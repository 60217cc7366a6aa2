//! Date parsing for sheet cells.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Spreadsheet serial day zero (serial 1 is 1899-12-31; the 1900 leap-year
/// bug is folded into the offset for every date after February 1900).
fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Lowest and highest serial numbers accepted (1900-01-01 to 9999-12-31).
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=2_958_465.0;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

/// Convert a spreadsheet serial date (days since 1899-12-30, fraction = time of day).
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    serial_epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// Parse a cell value into a point in time.
///
/// Accepts RFC 3339 timestamps (kept at their own offset's wall-clock time), ISO
/// dates with or without a time part, `YYYY/MM/DD`, US-style `MM/DD/YYYY`,
/// `DD-Mon-YYYY` and bare serial numbers. Blank or unrecognised values
/// yield `None`.
pub fn parse_cell_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    value.parse::<f64>().ok().and_then(serial_to_datetime)
}

/// First instant of a calendar day.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last millisecond of a calendar day (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(date))
}
