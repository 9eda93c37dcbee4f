//! Date arithmetic for advancing newsletter schedules.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::Frequency;

/// Number of days in the month containing `date` (28-31).
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("first of month is always a valid date");

    first_of_next
        .pred_opt()
        .expect("a first-of-month always has a previous day")
        .day()
}

impl Frequency {
    /// The next send date after a pass on `from`.
    ///
    /// Daily and weekly are fixed offsets. Monthly advances by the length of
    /// the month the send happened in, so a monthly newsletter drifts with
    /// calendar month lengths rather than pinning to a day-of-month.
    pub fn next_start_date(self, from: NaiveDate) -> NaiveDate {
        let days = match self {
            Frequency::Daily => 1,
            Frequency::Weekly => 7,
            Frequency::Monthly => i64::from(days_in_month(from)),
        };
        from + Duration::days(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(date(2024, 1, 15)), 31);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
        assert_eq!(days_in_month(date(2024, 2, 10)), 29); // leap year
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
    }

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            Frequency::Daily.next_start_date(date(2024, 3, 1)),
            date(2024, 3, 2)
        );
        // across a month boundary
        assert_eq!(
            Frequency::Daily.next_start_date(date(2024, 1, 31)),
            date(2024, 2, 1)
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            Frequency::Weekly.next_start_date(date(2024, 3, 1)),
            date(2024, 3, 8)
        );
        // across a year boundary
        assert_eq!(
            Frequency::Weekly.next_start_date(date(2024, 12, 30)),
            date(2025, 1, 6)
        );
    }

    #[test]
    fn monthly_advances_by_current_month_length() {
        // January has 31 days
        assert_eq!(
            Frequency::Monthly.next_start_date(date(2024, 1, 15)),
            date(2024, 2, 15)
        );
        // leap February has 29
        assert_eq!(
            Frequency::Monthly.next_start_date(date(2024, 2, 15)),
            date(2024, 3, 15)
        );
        // non-leap February has 28
        assert_eq!(
            Frequency::Monthly.next_start_date(date(2023, 2, 15)),
            date(2023, 3, 15)
        );
        // December rolls into the next year
        assert_eq!(
            Frequency::Monthly.next_start_date(date(2024, 12, 15)),
            date(2025, 1, 15)
        );
    }
}
