//! calendar helpers for monthly service dates

use chrono::Datelike;
use chrono::{Duration, NaiveDate, Weekday};

/// extract all sundays of a given month
///
/// # Arguments
/// * `year` - calendar year of the month
/// * `month` - month to extract, 1 = january
///
pub fn sundays_of_month(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let until_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    let mut current = first + Duration::days(i64::from(until_sunday));

    let mut dates = Vec::new();
    while current.month() == month {
        dates.push(current);
        current += Duration::days(7);
    }

    dates
}

/// the calendar month immediately before (year, month), wrapping january back
/// to december
pub fn prior_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// whole weeks between two dates
pub fn weeks_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days() / 7
}

/// true if the date falls on a sunday
pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn returns_all_sundays_of_a_four_sunday_month() {
        let result = sundays_of_month(2026, 2);

        let expected = vec![d(2026, 2, 1), d(2026, 2, 8), d(2026, 2, 15), d(2026, 2, 22)];
        assert_eq!(expected, result);
    }

    #[test]
    fn returns_all_sundays_of_a_five_sunday_month() {
        let result = sundays_of_month(2026, 3);

        let expected = vec![
            d(2026, 3, 1),
            d(2026, 3, 8),
            d(2026, 3, 15),
            d(2026, 3, 22),
            d(2026, 3, 29),
        ];
        assert_eq!(expected, result);
    }

    #[test]
    fn first_sunday_is_found_mid_week() {
        let result = sundays_of_month(2026, 1);

        assert_eq!(
            vec![d(2026, 1, 4), d(2026, 1, 11), d(2026, 1, 18), d(2026, 1, 25)],
            result
        );
        assert!(result.iter().all(|date| is_sunday(*date)));
    }

    #[test]
    fn invalid_month_yields_no_dates() {
        assert!(sundays_of_month(2026, 13).is_empty());
    }

    #[test]
    fn prior_month_wraps_january_to_december() {
        assert_eq!((2026, 1), prior_month(2026, 2));
        assert_eq!((2025, 12), prior_month(2026, 1));
    }

    #[test]
    fn weeks_between_counts_whole_weeks() {
        assert_eq!(0, weeks_between(d(2026, 2, 1), d(2026, 2, 6)));
        assert_eq!(1, weeks_between(d(2026, 2, 1), d(2026, 2, 8)));
        assert_eq!(5, weeks_between(d(2026, 1, 25), d(2026, 3, 1)));
    }
}
