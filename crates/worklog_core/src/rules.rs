//! Time-scoped compensation policy.
//!
//! # Responsibility
//! - Model policy values (quota hours, compensation multipliers) that change
//!   over time, and resolve the set in effect on a given day.
//!
//! # Invariants
//! - Timeline entries are ordered by start ascending.
//! - A kind with no applicable entry resolves to 0, meaning the feature is
//!   inert for that day.

use crate::model::config::Config;
use crate::timeutil::day_start;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

const DEFAULT_HOLIDAY_FACTOR: f64 = 2.0;
const DEFAULT_ON_CALL_FACTOR: f64 = 1.5;
const WORKDAYS_PER_WEEK: i32 = 5;

/// Policy dimension a rule entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Weekly work quota, in hours.
    WeeklyHours,
    /// Worked off-day = (factor * worktime) of in-lieu.
    HolidayFactor,
    /// On-call worktime = (factor * worktime) of in-lieu.
    OnCallFactor,
}

/// One time-scoped policy value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleEntry {
    pub kind: RuleKind,
    pub value: f64,
    /// `UNIX_EPOCH` means "since the beginning".
    pub start: DateTime<Utc>,
    /// `None` means the rule is still in effect.
    pub end: Option<DateTime<Utc>>,
}

impl RuleEntry {
    /// A rule in effect since the beginning with no end.
    pub fn always(kind: RuleKind, value: f64) -> Self {
        Self {
            kind,
            value,
            start: DateTime::UNIX_EPOCH,
            end: None,
        }
    }
}

/// Policy values resolved for one specific day.
///
/// Later-starting entries win over earlier ones of the same kind, modeling
/// policy supersession. Missing kinds stay at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RuleSnapshot {
    pub weekly_hours: f64,
    pub holiday_factor: f64,
    pub on_call_factor: f64,
}

impl RuleSnapshot {
    fn record(&mut self, kind: RuleKind, value: f64) {
        match kind {
            RuleKind::WeeklyHours => self.weekly_hours = value,
            RuleKind::HolidayFactor => self.holiday_factor = value,
            RuleKind::OnCallFactor => self.on_call_factor = value,
        }
    }

    /// Daily work quota derived from the weekly quota.
    pub fn daily_quota(&self) -> TimeDelta {
        let weekly_seconds = (self.weekly_hours * 3600.0).round() as i64;
        TimeDelta::seconds(weekly_seconds / i64::from(WORKDAYS_PER_WEEK))
    }
}

/// Policy entries ordered by start time ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulesTimeline {
    entries: Vec<RuleEntry>,
}

impl RulesTimeline {
    /// Builds a timeline from entries, restoring start ordering.
    pub fn new(mut entries: Vec<RuleEntry>) -> Self {
        entries.sort_by_key(|entry| entry.start);
        Self { entries }
    }

    /// Standing policy derived from the persisted configuration: the
    /// configured weekly quota plus the default compensation factors.
    pub fn from_config(config: &Config) -> Self {
        let weekly_hours =
            config.weekly_hours.num_seconds() as f64 / 3600.0;

        Self::new(vec![
            RuleEntry::always(RuleKind::WeeklyHours, weekly_hours),
            RuleEntry::always(RuleKind::HolidayFactor, DEFAULT_HOLIDAY_FACTOR),
            RuleEntry::always(RuleKind::OnCallFactor, DEFAULT_ON_CALL_FACTOR),
        ])
    }

    /// Resolves the rules applicable on the given day.
    ///
    /// The scan exits early once an entry starts after the day, which the
    /// ascending order guarantees is safe.
    pub fn for_day(&self, day: NaiveDate) -> RuleSnapshot {
        let day = day_start(day);

        let mut snapshot = RuleSnapshot::default();
        for entry in &self.entries {
            if entry.start > day {
                break;
            }

            if entry.end.map_or(true, |end| day < end) {
                snapshot.record(entry.kind, entry.value);
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleEntry, RuleKind, RulesTimeline};
    use crate::model::config::Config;
    use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_timeline_resolves_to_zero() {
        let snapshot = RulesTimeline::default().for_day(day(2024, 1, 8));
        assert_eq!(snapshot.weekly_hours, 0.0);
        assert_eq!(snapshot.holiday_factor, 0.0);
        assert_eq!(snapshot.on_call_factor, 0.0);
        assert_eq!(snapshot.daily_quota(), TimeDelta::zero());
    }

    #[test]
    fn later_entries_supersede_earlier_ones() {
        let timeline = RulesTimeline::new(vec![
            RuleEntry::always(RuleKind::WeeklyHours, 39.0),
            RuleEntry {
                kind: RuleKind::WeeklyHours,
                value: 32.0,
                start: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                end: None,
            },
        ]);

        assert_eq!(timeline.for_day(day(2024, 1, 15)).weekly_hours, 39.0);
        assert_eq!(timeline.for_day(day(2024, 2, 15)).weekly_hours, 32.0);
    }

    #[test]
    fn ended_rules_no_longer_apply() {
        let timeline = RulesTimeline::new(vec![RuleEntry {
            kind: RuleKind::OnCallFactor,
            value: 1.5,
            start: DateTime::UNIX_EPOCH,
            end: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        }]);

        assert_eq!(timeline.for_day(day(2024, 5, 31)).on_call_factor, 1.5);
        assert_eq!(timeline.for_day(day(2024, 6, 1)).on_call_factor, 0.0);
    }

    #[test]
    fn future_entries_do_not_leak_into_the_past() {
        let timeline = RulesTimeline::new(vec![RuleEntry {
            kind: RuleKind::HolidayFactor,
            value: 2.0,
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: None,
        }]);

        assert_eq!(timeline.for_day(day(2024, 2, 28)).holiday_factor, 0.0);
        assert_eq!(timeline.for_day(day(2024, 3, 1)).holiday_factor, 2.0);
    }

    #[test]
    fn from_config_carries_quota_and_default_factors() {
        let config = Config {
            weekly_hours: TimeDelta::hours(40),
            monthly_hours: TimeDelta::zero(),
        };
        let snapshot = RulesTimeline::from_config(&config).for_day(day(2024, 1, 8));

        assert_eq!(snapshot.weekly_hours, 40.0);
        assert_eq!(snapshot.holiday_factor, 2.0);
        assert_eq!(snapshot.on_call_factor, 1.5);
        assert_eq!(snapshot.daily_quota(), TimeDelta::hours(8));
    }
}
