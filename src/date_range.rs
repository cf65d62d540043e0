//! Observation windows relative to a migration's go-live date.

use chrono::{Days, NaiveDate, NaiveTime};
use serde::Serialize;

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Window of `weeks` weeks ending on `end_date` inclusive.
    fn weeks_ending(end_date: NaiveDate, weeks: u64) -> Self {
        let start_date = end_date - Days::new(weeks * 7) + Days::new(1);
        Self {
            start_date,
            end_date,
        }
    }

    /// Earliest instant of the window, in the search platform's time syntax.
    pub fn earliest_time(&self) -> String {
        self.start_date
            .and_time(NaiveTime::MIN)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    /// Exclusive upper bound: midnight after `end_date`.
    pub fn latest_time(&self) -> String {
        (self.end_date + Days::new(1))
            .and_time(NaiveTime::MIN)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Twelve weeks of normal activity, ending two weeks before go-live.
pub fn baseline_date_range(go_live: NaiveDate) -> DateRange {
    DateRange::weeks_ending(go_live - Days::new(14), 12)
}

/// Three weeks of old-system traffic, ending one week after go-live.
pub fn pre_cutover_date_range(go_live: NaiveDate) -> DateRange {
    DateRange::weeks_ending(go_live + Days::new(7), 3)
}

/// Three weeks of new-system traffic, ending two weeks after go-live.
pub fn post_cutover_date_range(go_live: NaiveDate) -> DateRange {
    DateRange::weeks_ending(go_live + Days::new(14), 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_baseline_date_range() {
        let range = baseline_date_range(date(2021, 7, 12));
        assert_eq!(range.start_date, date(2021, 4, 6));
        assert_eq!(range.end_date, date(2021, 6, 28));
    }

    #[test]
    fn test_pre_cutover_date_range() {
        let range = pre_cutover_date_range(date(2021, 7, 12));
        assert_eq!(range.start_date, date(2021, 6, 29));
        assert_eq!(range.end_date, date(2021, 7, 19));
    }

    #[test]
    fn test_post_cutover_date_range() {
        let range = post_cutover_date_range(date(2021, 7, 12));
        assert_eq!(range.start_date, date(2021, 7, 6));
        assert_eq!(range.end_date, date(2021, 7, 26));
    }

    #[test]
    fn test_search_time_bounds_cover_whole_end_day() {
        let range = post_cutover_date_range(date(2021, 7, 12));
        assert_eq!(range.earliest_time(), "2021-07-06T00:00:00");
        assert_eq!(range.latest_time(), "2021-07-27T00:00:00");
        assert!(range.contains(date(2021, 7, 26)));
        assert!(!range.contains(date(2021, 7, 27)));
    }
}
