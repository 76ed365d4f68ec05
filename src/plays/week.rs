//! Chart week bucketing.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

/// The instant at which a chart week starts, e.g. every Friday at 06:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCutover {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeekCutover {
    /// Returns None if `hour` is not a valid hour of the day.
    pub fn new(weekday: Weekday, hour: u32) -> Option<Self> {
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        Some(Self { weekday, time })
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    /// Date of the cutover that starts the week containing `at`.
    ///
    /// An instant exactly on the cutover belongs to the week it starts.
    pub fn week_of(&self, at: NaiveDateTime) -> NaiveDate {
        let days_since = (at.weekday().num_days_from_monday() + 7
            - self.weekday.num_days_from_monday())
            % 7;
        let mut start = at.date() - Duration::days(days_since as i64);
        if at < start.and_time(self.time) {
            start -= Duration::days(7);
        }
        start
    }
}

impl Default for WeekCutover {
    fn default() -> Self {
        Self {
            weekday: Weekday::Fri,
            time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
        }
    }
}

/// Week keys from `first` through `last`, one per 7 days.
pub fn weeks_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut weeks = Vec::new();
    let mut week = first;
    while week <= last {
        weeks.push(week);
        week += Duration::days(7);
    }
    weeks
}

/// Parses a weekday name such as "fri" or "Friday".
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}
