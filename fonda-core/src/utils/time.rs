//! Business-time helpers
//!
//! All date→timestamp conversion happens at the service layer; the store
//! only ever sees `i64` Unix millis. The business day does not start at
//! midnight: orders before the configured cutoff belong to the previous
//! date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Compute the business date a timestamp falls on
///
/// Local time before the cutoff → still "yesterday's" business day.
pub fn business_date(now_millis: i64, cutoff: NaiveTime, tz: Tz) -> NaiveDate {
    let local = to_local(now_millis, tz);
    if local.time() < cutoff {
        (local - chrono::Duration::days(1)).date_naive()
    } else {
        local.date_naive()
    }
}

/// Receipt-number date key, `YYYYMMDD`
pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// Date + cutoff time → Unix millis (business timezone)
///
/// DST gap fallback: if the local time does not exist, fall back to UTC.
pub fn date_cutoff_millis(date: NaiveDate, cutoff: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(cutoff);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Half-open business-day range `[start, end)` for a date
pub fn business_day_range(date: NaiveDate, cutoff: NaiveTime, tz: Tz) -> (i64, i64) {
    let next = date.succ_opt().unwrap_or(date);
    (
        date_cutoff_millis(date, cutoff, tz),
        date_cutoff_millis(next, cutoff, tz),
    )
}

/// Local hour of day (0-23) for a timestamp
pub fn hour_of_day(millis: i64, tz: Tz) -> u32 {
    to_local(millis, tz).hour()
}

fn to_local(millis: i64, tz: Tz) -> DateTime<Tz> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
        .with_timezone(&tz)
}
