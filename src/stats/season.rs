use std::fmt::Display;

use ansi_term::Colour;
use chrono::{Duration, NaiveDate};

use super::daily::DailyTotals;

/// Seasons are 60 day scoring windows tiled back to back from a fixed
/// anchor day. Finishing a season resets the gauge, ranks are earned again.
pub const SEASON_LENGTH_DAYS: i64 = 60;

/// First day of the first season.
pub const SEASON_ANCHOR: NaiveDate = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

pub const XP_PER_DEEP_HOUR: f64 = 100.;
pub const XP_PER_SHALLOW_HOUR: f64 = 50.;
/// Flat bonus for a day that reached the goal of 6h deep or 8h total.
pub const DAILY_GOAL_BONUS: f64 = 200.;

const FIRST_LEVEL_THRESHOLD: f64 = 500.;
const THRESHOLD_GROWTH: f64 = 1.35;

/// Cosmetic tier derived from the level. Carries the display colour and an
/// icon name, nothing downstream interprets those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
}

impl Rank {
    pub fn for_level(level: u32) -> Rank {
        match level {
            51.. => Rank::Master,
            41.. => Rank::Diamond,
            31.. => Rank::Platinum,
            21.. => Rank::Gold,
            11.. => Rank::Silver,
            _ => Rank::Bronze,
        }
    }

    pub fn colour(&self) -> Colour {
        match self {
            Rank::Bronze => Colour::Fixed(208),
            Rank::Silver => Colour::Fixed(250),
            Rank::Gold => Colour::Yellow,
            Rank::Platinum => Colour::Cyan,
            Rank::Diamond => Colour::Blue,
            Rank::Master => Colour::Purple,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Rank::Bronze => "award",
            Rank::Silver => "star",
            Rank::Gold => "zap",
            Rank::Platinum => "star",
            Rank::Diamond => "award",
            Rank::Master => "trophy",
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Bronze => write!(f, "Bronze"),
            Rank::Silver => write!(f, "Silver"),
            Rank::Gold => write!(f, "Gold"),
            Rank::Platinum => write!(f, "Platinum"),
            Rank::Diamond => write!(f, "Diamond"),
            Rank::Master => write!(f, "Master"),
        }
    }
}

/// Everything the season gauge shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSummary {
    pub total_xp: f64,
    pub level: u32,
    /// XP gathered inside the current level.
    pub level_xp: f64,
    /// XP the current level needs before the next one unlocks.
    pub xp_for_next_level: f64,
    pub rank: Rank,
    /// Zero based day offset into the running season.
    pub season_day: i64,
    pub days_remaining: i64,
}

/// First and last calendar day of the season `today` falls into.
pub fn season_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let season_day = (today - SEASON_ANCHOR).num_days().rem_euclid(SEASON_LENGTH_DAYS);
    let start = today - Duration::days(season_day);
    (start, start + Duration::days(SEASON_LENGTH_DAYS - 1))
}

/// Scores the season `today` falls into.
///
/// Every elapsed season day earns 100 XP per deep hour and 50 per shallow
/// hour, plus a flat 200 when the day reached the goal. Days the season has
/// not reached yet contribute nothing, days without sessions count as zero.
pub fn compute_season(daily: &DailyTotals, today: NaiveDate) -> SeasonSummary {
    let (season_start, _) = season_bounds(today);
    let season_day = (today - season_start).num_days();

    let mut total_xp = 0.;
    for offset in 0..SEASON_LENGTH_DAYS {
        let date = season_start + Duration::days(offset);
        if date > today {
            break;
        }
        let day = daily.get(&date).copied().unwrap_or_default();
        total_xp += day.deep * XP_PER_DEEP_HOUR + day.shallow * XP_PER_SHALLOW_HOUR;
        if day.goal_reached() {
            total_xp += DAILY_GOAL_BONUS;
        }
    }

    let (level, level_xp, xp_for_next_level) = resolve_level(total_xp);

    SeasonSummary {
        total_xp,
        level,
        level_xp,
        xp_for_next_level,
        rank: Rank::for_level(level),
        season_day,
        days_remaining: SEASON_LENGTH_DAYS - season_day,
    }
}

/// Walks the compounding thresholds: 500 XP from level 1 to 2, then 35%
/// more for each level after, floored to whole XP. The curve is meant to be
/// steep, high levels should stay rare.
fn resolve_level(total_xp: f64) -> (u32, f64, f64) {
    let mut level = 1u32;
    let mut accumulated = 0.;
    let mut next = FIRST_LEVEL_THRESHOLD;

    while total_xp >= accumulated + next {
        accumulated += next;
        level += 1;
        next = (next * THRESHOLD_GROWTH).floor();
    }

    (level, total_xp - accumulated, next)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{compute_season, resolve_level, season_bounds, Rank, SEASON_ANCHOR};
    use crate::stats::daily::{DailyTotals, DayTotals};

    fn day(deep: f64, shallow: f64) -> DayTotals {
        DayTotals {
            deep,
            shallow,
            total: deep + shallow,
        }
    }

    #[test]
    fn test_level_threshold_boundary() {
        // Crossing level 2 takes 500 XP, level 3 another 675.
        let (level, in_level, next) = resolve_level(1174.);
        assert_eq!(level, 2);
        assert_eq!(in_level, 674.);
        assert_eq!(next, 675.);

        let (level, in_level, next) = resolve_level(1175.);
        assert_eq!(level, 3);
        assert_eq!(in_level, 0.);
        assert_eq!(next, 911.);
    }

    #[test]
    fn test_zero_xp_is_level_one() {
        let (level, in_level, next) = resolve_level(0.);
        assert_eq!(level, 1);
        assert_eq!(in_level, 0.);
        assert_eq!(next, 500.);
    }

    #[test]
    fn test_goal_day_earns_bonus() {
        let today = SEASON_ANCHOR + Duration::days(9);
        let mut daily = DailyTotals::new();
        daily.insert(SEASON_ANCHOR + Duration::days(2), day(6., 0.));

        let summary = compute_season(&daily, today);
        assert_eq!(summary.total_xp, 6. * 100. + 200.);
    }

    #[test]
    fn test_future_season_days_are_excluded() {
        let today = SEASON_ANCHOR + Duration::days(9);
        let mut daily = DailyTotals::new();
        daily.insert(today + Duration::days(1), day(4., 0.));

        let summary = compute_season(&daily, today);
        assert_eq!(summary.total_xp, 0.);
        assert_eq!(summary.level, 1);
    }

    #[test]
    fn test_days_outside_the_season_are_excluded() {
        let today = SEASON_ANCHOR + Duration::days(61);
        let mut daily = DailyTotals::new();
        // Previous season, one day before the running one started.
        daily.insert(SEASON_ANCHOR + Duration::days(59), day(8., 0.));

        let summary = compute_season(&daily, today);
        assert_eq!(summary.total_xp, 0.);
        assert_eq!(summary.season_day, 1);
        assert_eq!(summary.days_remaining, 59);
    }

    #[test]
    fn test_more_hours_never_lower_xp() {
        let today = SEASON_ANCHOR + Duration::days(20);
        let tracked = SEASON_ANCHOR + Duration::days(5);

        let mut sparse = DailyTotals::new();
        sparse.insert(tracked, day(2., 1.));
        let mut denser = sparse.clone();
        denser.insert(tracked, day(2., 3.));

        assert!(
            compute_season(&denser, today).total_xp > compute_season(&sparse, today).total_xp
        );
    }

    #[test]
    fn test_season_bounds_tile_the_anchor() {
        let (start, end) = season_bounds(SEASON_ANCHOR + Duration::days(9));
        assert_eq!(start, SEASON_ANCHOR);
        assert_eq!(end, SEASON_ANCHOR + Duration::days(59));

        let (start, _) = season_bounds(SEASON_ANCHOR + Duration::days(60));
        assert_eq!(start, SEASON_ANCHOR + Duration::days(60));

        // Days before the anchor still land on a well formed season.
        let (start, _) = season_bounds(SEASON_ANCHOR - Duration::days(1));
        assert_eq!(start, SEASON_ANCHOR - Duration::days(60));
    }

    #[test]
    fn test_rank_boundaries() {
        assert_eq!(Rank::for_level(1), Rank::Bronze);
        assert_eq!(Rank::for_level(10), Rank::Bronze);
        assert_eq!(Rank::for_level(11), Rank::Silver);
        assert_eq!(Rank::for_level(21), Rank::Gold);
        assert_eq!(Rank::for_level(31), Rank::Platinum);
        assert_eq!(Rank::for_level(41), Rank::Diamond);
        assert_eq!(Rank::for_level(50), Rank::Diamond);
        assert_eq!(Rank::for_level(51), Rank::Master);
    }

    #[test]
    fn test_anchor_day_starts_a_season() {
        let summary = compute_season(&DailyTotals::new(), SEASON_ANCHOR);
        assert_eq!(summary.season_day, 0);
        assert_eq!(summary.days_remaining, 60);
    }

    #[test]
    fn test_rank_decoration_is_stable() {
        assert_eq!(Rank::Master.icon(), "trophy");
        assert_eq!(Rank::for_level(51).to_string(), "Master");
    }
}
