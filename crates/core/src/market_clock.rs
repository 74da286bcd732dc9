//! US equity session hours.
//!
//! The session is Monday through Friday, 09:30 (inclusive) to 16:00
//! (exclusive) US Eastern civil time. Exchange holidays are not consulted.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::US::Eastern;

/// Regular session open, Eastern time.
pub const SESSION_OPEN: (u32, u32) = (9, 30);

/// Regular session close, Eastern time.
pub const SESSION_CLOSE: (u32, u32) = (16, 0);

/// Returns true if the regular session is open at `now`.
#[must_use]
pub fn is_open(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&Eastern);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let time = local.time();
    let open = session_time(SESSION_OPEN);
    let close = session_time(SESSION_CLOSE);
    match (open, close) {
        (Some(open), Some(close)) => time >= open && time < close,
        _ => false,
    }
}

/// Calendar date of `now` in Eastern time, the trading date.
#[must_use]
pub fn trading_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Eastern).date_naive()
}

fn session_time((hour, minute): (u32, u32)) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}
