//! Localizing naive timestamps exported by the previous version of the site.
//!
//! The old exports were not timezone aware: times were written as the band's
//! wall-clock time, sometimes with a bogus `+00:00` suffix tacked on.

use chrono::{Duration as ChronoDuration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use time::{OffsetDateTime, UtcOffset};

use crate::error::{GigoError, GigoResult};

const SPURIOUS_UTC_SUFFIX: &str = "+00:00";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

pub fn parse_timezone(timezone: &str) -> GigoResult<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| GigoError::UnknownTimezone(timezone.to_owned()))
}

/// Reads a legacy timestamp as wall-clock time in `timezone`.
///
/// The time is not converted: `2020-01-01T19:00:00+00:00` in `America/New_York`
/// becomes 7 PM Eastern.
pub fn localize_legacy_timestamp(timestamp: &str, timezone: &str) -> GigoResult<OffsetDateTime> {
    let tz = parse_timezone(timezone)?;
    let naive = parse_naive(&timestamp.replace(SPURIOUS_UTC_SUFFIX, ""))?;

    attach_timezone(naive, tz)
}

/// Shows an instant as wall-clock time in `timezone`.
pub fn to_local_time(instant: OffsetDateTime, timezone: &str) -> GigoResult<OffsetDateTime> {
    let tz = parse_timezone(timezone)?;
    let utc = chrono::DateTime::from_timestamp(instant.unix_timestamp(), 0)
        .ok_or_else(|| GigoError::Parse(instant.to_string()))?;
    let offset_seconds = tz.offset_from_utc_datetime(&utc.naive_utc()).fix().local_minus_utc();
    let offset = UtcOffset::from_whole_seconds(offset_seconds)
        .map_err(|err| GigoError::Parse(format!("{}: {}", instant, err)))?;

    Ok(instant.to_offset(offset))
}

fn parse_naive(timestamp: &str) -> GigoResult<NaiveDateTime> {
    let trimmed = timestamp.trim();

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| GigoError::Parse(timestamp.to_owned()))
}

fn attach_timezone(naive: NaiveDateTime, tz: Tz) -> GigoResult<OffsetDateTime> {
    let offset_seconds = match tz.offset_from_local_datetime(&naive) {
        LocalResult::Single(offset) => offset.fix().local_minus_utc(),
        // fall back: the second pass through the hour is standard time
        LocalResult::Ambiguous(earlier, later) => {
            let (earlier, later) = (earlier.fix(), later.fix());
            earlier.local_minus_utc().min(later.local_minus_utc())
        }
        // spring forward: keep the offset in force just before the gap
        LocalResult::None => {
            match tz.offset_from_local_datetime(&(naive - ChronoDuration::hours(1))) {
                LocalResult::Single(offset) => offset.fix().local_minus_utc(),
                _ => return Err(GigoError::Parse(naive.to_string())),
            }
        }
    };

    let offset = UtcOffset::from_whole_seconds(offset_seconds)
        .map_err(|err| GigoError::Parse(format!("{}: {}", naive, err)))?;
    let utc_seconds = naive.and_utc().timestamp() - i64::from(offset_seconds);
    let instant = OffsetDateTime::from_unix_timestamp(utc_seconds)
        .map_err(|err| GigoError::Parse(format!("{}: {}", naive, err)))?
        + time::Duration::nanoseconds(i64::from(naive.and_utc().timestamp_subsec_nanos()));

    Ok(instant.to_offset(offset))
}
