//! Line-level decoding of IGC files.
//!
//! Only the records the flight book needs are decoded: the `HFDTE` date, the
//! `HFGTY` glider type, and `B` position fixes.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::trace;

use crate::track::Fix;

/// Minimum length of a B record without extensions.
const B_RECORD_LEN: usize = 35;

/// A fix earlier than its predecessor by more than this starts the next day;
/// a smaller step back is a clock glitch and the fix is dropped.
const MIDNIGHT_WRAP_HOURS: i64 = 12;

/// The decoded content of one IGC file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgcLog {
    /// Flight date from the `HFDTE` header.
    pub date: Option<NaiveDate>,
    /// Glider type from the `GTY` header.
    pub glider_type: Option<String>,
    /// Position fixes in file order.
    pub fixes: Vec<Fix>,
    /// B records that could not be decoded.
    pub skipped_records: usize,
}

/// A B record before it is anchored to a date.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BRecord {
    time: NaiveTime,
    lat: f64,
    lon: f64,
    pressure_alt: i32,
    gnss_alt: i32,
}

/// Decode the text of an IGC file.
///
/// B records seen before the date header, or in a file without one, are
/// counted as skipped since they cannot be given a timestamp. So are fixes
/// that step back in time without crossing midnight.
#[must_use]
pub fn read_log(text: &str) -> IgcLog {
    let mut log = IgcLog::default();
    let mut day_offset = 0;
    let mut previous: Option<NaiveTime> = None;

    for line in text.lines().map(str::trim_end) {
        if let Some(rest) = line.strip_prefix("HFDTE") {
            log.date = parse_date(rest);
        } else if is_glider_type_header(line) {
            log.glider_type = line
                .split_once(':')
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty());
        } else if line.starts_with('B') {
            let (Some(date), Some(record)) = (log.date, parse_b_record(line)) else {
                trace!(line, "Skipping B record");
                log.skipped_records += 1;
                continue;
            };
            if let Some(prev) = previous.filter(|prev| record.time < *prev) {
                if prev - record.time > Duration::hours(MIDNIGHT_WRAP_HOURS) {
                    // the recorder clock wrapped past midnight UTC
                    day_offset += 1;
                } else {
                    trace!(line, "Skipping out-of-order B record");
                    log.skipped_records += 1;
                    continue;
                }
            }
            previous = Some(record.time);

            let naive = (date + Duration::days(day_offset)).and_time(record.time);
            log.fixes.push(Fix {
                timestamp: Utc.from_utc_datetime(&naive),
                lat: record.lat,
                lon: record.lon,
                pressure_alt: record.pressure_alt,
                gnss_alt: record.gnss_alt,
            });
        }
    }

    log
}

fn is_glider_type_header(line: &str) -> bool {
    line.len() >= 5 && line.starts_with('H') && line.get(2..5) == Some("GTY")
}

/// Parse the value of an `HFDTE` header: `ddmmyy` or `DATE:ddmmyy,nn`.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.strip_prefix("DATE:").unwrap_or(value);
    let digits = value.get(..6)?;
    let day = digits.get(0..2)?.parse().ok()?;
    let month = digits.get(2..4)?.parse().ok()?;
    let yy: i32 = digits.get(4..6)?.parse().ok()?;
    let year = if yy < 80 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse `BHHMMSSDDMMmmmNDDDMMmmmEVPPPPPGGGGG`.
fn parse_b_record(line: &str) -> Option<BRecord> {
    if line.len() < B_RECORD_LEN || !line.is_ascii() {
        return None;
    }
    let time = NaiveTime::from_hms_opt(
        line[1..3].parse().ok()?,
        line[3..5].parse().ok()?,
        line[5..7].parse().ok()?,
    )?;
    let lat = parse_angle(&line[7..9], &line[9..14], &line[14..15], "N", "S")?;
    let lon = parse_angle(&line[15..18], &line[18..23], &line[23..24], "E", "W")?;
    let pressure_alt = line[25..30].parse().ok()?;
    let gnss_alt = line[30..35].parse().ok()?;

    Some(BRecord {
        time,
        lat,
        lon,
        pressure_alt,
        gnss_alt,
    })
}

/// Degrees plus thousandths of minutes, signed by hemisphere.
fn parse_angle(
    degrees: &str,
    milli_minutes: &str,
    hemisphere: &str,
    positive: &str,
    negative: &str,
) -> Option<f64> {
    let degrees: u32 = degrees.parse().ok()?;
    let milli_minutes: u32 = milli_minutes.parse().ok()?;
    let value = f64::from(degrees) + f64::from(milli_minutes) / 60_000.0;
    match hemisphere {
        h if h == positive => Some(value),
        h if h == negative => Some(-value),
        _ => None,
    }
}
