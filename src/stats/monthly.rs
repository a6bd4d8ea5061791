use chrono::{Datelike, Duration, NaiveDate};

use super::daily::{DailyTotals, DayTotals};

/// Aggregated view of the month `today` falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    /// One entry per calendar day of the month, in order. Days without
    /// sessions carry zero totals, future days are included as zero too.
    pub days: Vec<(NaiveDate, DayTotals)>,
    pub total: DayTotals,
    /// Daily averages over the days strictly before today. Today is left
    /// out so a morning glance compares finished days only.
    pub average: DayTotals,
    /// Days of the month with any tracked time, today included.
    pub days_with_data: usize,
}

/// Totals and daily averages for the month `today` belongs to.
pub fn month_summary(daily: &DailyTotals, today: NaiveDate) -> MonthSummary {
    let first = today.with_day(1).unwrap();
    let next_month_first = match first.month() {
        12 => NaiveDate::from_ymd_opt(first.year() + 1, 1, 1),
        m => NaiveDate::from_ymd_opt(first.year(), m + 1, 1),
    }
    .unwrap();
    let days_in_month = (next_month_first - first).num_days();

    let days: Vec<(NaiveDate, DayTotals)> = (0..days_in_month)
        .map(|offset| {
            let date = first + Duration::days(offset);
            (date, daily.get(&date).copied().unwrap_or_default())
        })
        .collect();

    let mut total = DayTotals::default();
    let mut before_today = DayTotals::default();
    let mut days_with_data = 0;
    for (date, day) in &days {
        total.deep += day.deep;
        total.shallow += day.shallow;
        if day.total > 0. {
            days_with_data += 1;
        }
        if *date < today {
            before_today.deep += day.deep;
            before_today.shallow += day.shallow;
        }
    }
    total.total = total.deep + total.shallow;

    // On the first of the month there is nothing finished yet, divide by
    // one instead of zero.
    let divisor = (today.day() as f64 - 1.).max(1.);
    let average = DayTotals {
        deep: before_today.deep / divisor,
        shallow: before_today.shallow / divisor,
        total: (before_today.deep + before_today.shallow) / divisor,
    };

    MonthSummary {
        days,
        total,
        average,
        days_with_data,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::month_summary;
    use crate::stats::daily::{DailyTotals, DayTotals};

    fn day(deep: f64, shallow: f64) -> DayTotals {
        DayTotals {
            deep,
            shallow,
            total: deep + shallow,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_averages_exclude_today() {
        let mut daily = DailyTotals::new();
        daily.insert(date(1), day(2., 0.));
        daily.insert(date(2), day(4., 2.));
        daily.insert(date(3), day(10., 10.));

        // Two finished days before the 3rd.
        let summary = month_summary(&daily, date(3));
        assert_eq!(summary.average.deep, 3.);
        assert_eq!(summary.average.shallow, 1.);
        assert_eq!(summary.average.total, 4.);

        // Today still shows up in the month totals.
        assert_eq!(summary.total.deep, 16.);
        assert_eq!(summary.total.total, 28.);
        assert_eq!(summary.days_with_data, 3);
    }

    #[test]
    fn test_first_of_month_divides_by_one() {
        let mut daily = DailyTotals::new();
        daily.insert(date(1), day(3., 0.));

        let summary = month_summary(&daily, date(1));
        assert_eq!(summary.average.deep, 0.);
        assert_eq!(summary.total.deep, 3.);
    }

    #[test]
    fn test_every_month_day_is_present() {
        let summary = month_summary(&DailyTotals::new(), date(15));
        assert_eq!(summary.days.len(), 30);
        assert_eq!(summary.days[0].0, date(1));
        assert_eq!(summary.days[29].0, date(30));
        assert_eq!(summary.days_with_data, 0);

        let december = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        assert_eq!(month_summary(&DailyTotals::new(), december).days.len(), 31);
    }

    #[test]
    fn test_other_months_are_ignored() {
        let mut daily = DailyTotals::new();
        daily.insert(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(), day(5., 0.));
        daily.insert(date(2), day(1., 0.));

        let summary = month_summary(&daily, date(10));
        assert_eq!(summary.total.deep, 1.);
    }
}
