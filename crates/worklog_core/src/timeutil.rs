//! Calendar helpers shared by the rules timeline and the report engine.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};

/// Truncates a timestamp to midnight of its calendar day.
pub(crate) fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// Midnight of the given calendar day.
pub(crate) fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// Monday of the week containing `day`.
pub(crate) fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - TimeDelta::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Saturday or Sunday under the fixed policy. Public holidays are deferred.
pub(crate) fn is_off_day(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Scales a duration by a policy factor, at second granularity.
pub(crate) fn scale(duration: TimeDelta, factor: f64) -> TimeDelta {
    let seconds = duration.num_seconds() as f64 * factor;
    TimeDelta::seconds(seconds.round() as i64)
}
