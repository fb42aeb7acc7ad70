//! Trading-calendar date arithmetic.
//!
//! Forecast labels must land on weekdays and be strictly increasing, so all
//! date stepping goes through one function that advances a day at a time and
//! skips Saturdays and Sundays. Exchange holidays are not modeled.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Whether the exchange is open on `date` (weekday check only).
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The date `count` trading days after `anchor`.
///
/// `count = 0` returns the anchor unchanged, even on a weekend; each further
/// step lands on the next weekday. Successive counts therefore yield
/// strictly increasing dates: a Friday anchor gives Monday, Tuesday,
/// Wednesday for counts 1, 2, 3.
pub fn add_trading_days(anchor: NaiveDate, count: u32) -> NaiveDate {
    let mut date = anchor;
    for _ in 0..count {
        date += Duration::days(1);
        while !is_trading_day(date) {
            date += Duration::days(1);
        }
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekdays_are_trading_days() {
        // 2024-01-01 is a Monday.
        assert!(is_trading_day(date(2024, 1, 1)));
        assert!(is_trading_day(date(2024, 1, 5)));
        assert!(!is_trading_day(date(2024, 1, 6)));
        assert!(!is_trading_day(date(2024, 1, 7)));
    }

    #[test]
    fn test_friday_anchor_skips_weekend() {
        // 2024-01-05 is a Friday.
        let friday = date(2024, 1, 5);
        assert_eq!(add_trading_days(friday, 1), date(2024, 1, 8)); // Monday
        assert_eq!(add_trading_days(friday, 2), date(2024, 1, 9)); // Tuesday
        assert_eq!(add_trading_days(friday, 3), date(2024, 1, 10)); // Wednesday
    }

    #[test]
    fn test_midweek_steps_are_consecutive() {
        // 2024-01-02 is a Tuesday.
        let tuesday = date(2024, 1, 2);
        assert_eq!(add_trading_days(tuesday, 1), date(2024, 1, 3));
        assert_eq!(add_trading_days(tuesday, 3), date(2024, 1, 5));
        assert_eq!(add_trading_days(tuesday, 4), date(2024, 1, 8));
    }

    #[test]
    fn test_zero_count_returns_anchor() {
        let saturday = date(2024, 1, 6);
        assert_eq!(add_trading_days(saturday, 0), saturday);
        // One step from a weekend anchor lands on the coming Monday.
        assert_eq!(add_trading_days(saturday, 1), date(2024, 1, 8));
    }

    #[test]
    fn test_long_horizon_is_strictly_increasing_and_weekday_only() {
        let anchor = date(2024, 1, 3);
        let mut previous = anchor;
        for count in 1..=40 {
            let next = add_trading_days(anchor, count);
            assert!(next > previous);
            assert!(is_trading_day(next));
            previous = next;
        }
    }
}
