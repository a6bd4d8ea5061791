use ansi_term::Colour;
use anyhow::Result;
use chrono::{Datelike, Local};
use futures::TryStreamExt;
use now::DateTimeNow;

use crate::{
    stats::{
        daily::aggregate_daily,
        monthly::month_summary,
        season::{compute_season, season_bounds},
    },
    store::local::LocalStore,
    utils::time::format_hours,
};

pub async fn today(store: LocalStore) -> Result<()> {
    let today = Local::now().date_naive();
    let sessions = store
        .load_between(today, today, &Local)
        .try_collect::<Vec<_>>()
        .await?;
    let totals = aggregate_daily(&sessions, &Local)
        .get(&today)
        .copied()
        .unwrap_or_default();

    println!("Today, {}", today.format("%A %-d %B"));
    println!(
        "  {}     {}",
        Colour::Green.paint("deep"),
        format_hours(totals.deep)
    );
    println!(
        "  {}  {}",
        Colour::Purple.paint("shallow"),
        format_hours(totals.shallow)
    );
    println!("  total    {}", format_hours(totals.total));
    if totals.goal_reached() {
        println!("  {}", Colour::Yellow.paint("goal reached"));
    }
    Ok(())
}

const MONTH_BAR_WIDTH: f64 = 40.;

pub async fn month(store: LocalStore) -> Result<()> {
    let now = Local::now();
    let today = now.date_naive();
    let month_start = now.beginning_of_month().date_naive();

    let sessions = store
        .load_between(month_start, today, &Local)
        .try_collect::<Vec<_>>()
        .await?;
    let daily = aggregate_daily(&sessions, &Local);
    let summary = month_summary(&daily, today);

    println!("{}", now.format("%B %Y"));

    // The chart scales to the longest day but never zooms in past 8h, a
    // normal working day should always look like one.
    let scale = summary
        .days
        .iter()
        .map(|(_, day)| day.total)
        .fold(8., f64::max);

    for (date, day) in &summary.days {
        if *date > today {
            break;
        }
        let deep_cells = (day.deep / scale * MONTH_BAR_WIDTH).round() as usize;
        let shallow_cells = (day.shallow / scale * MONTH_BAR_WIDTH).round() as usize;
        let marker = if *date == today { '>' } else { ' ' };
        let hours = if day.total > 0. {
            format_hours(day.total)
        } else {
            String::new()
        };
        println!(
            "{marker}{:2} {}{} {}",
            date.day(),
            Colour::Green.paint("█".repeat(deep_cells)),
            Colour::Purple.paint("█".repeat(shallow_cells)),
            hours
        );
    }

    println!();
    println!(
        "Daily averages before today: {} deep, {} shallow, {} total",
        format_hours(summary.average.deep),
        format_hours(summary.average.shallow),
        format_hours(summary.average.total)
    );
    println!(
        "Month total: {} over {} days ({} deep, {} shallow)",
        format_hours(summary.total.total),
        summary.days_with_data,
        format_hours(summary.total.deep),
        format_hours(summary.total.shallow)
    );
    Ok(())
}

const XP_BAR_WIDTH: usize = 30;

pub async fn season(store: LocalStore) -> Result<()> {
    let today = Local::now().date_naive();
    let (season_start, _) = season_bounds(today);

    let sessions = store
        .load_between(season_start, today, &Local)
        .try_collect::<Vec<_>>()
        .await?;
    let daily = aggregate_daily(&sessions, &Local);
    let summary = compute_season(&daily, today);

    let colour = summary.rank.colour();
    println!(
        "Level {}  {}",
        summary.level,
        colour.bold().paint(format!(
            "{} [{}]",
            summary.rank,
            summary.rank.icon()
        ))
    );

    let filled = if summary.xp_for_next_level > 0. {
        ((summary.level_xp / summary.xp_for_next_level) * XP_BAR_WIDTH as f64) as usize
    } else {
        0
    }
    .min(XP_BAR_WIDTH);
    println!(
        "  [{}{}] {:.0} / {:.0} XP",
        colour.paint("■".repeat(filled)),
        "·".repeat(XP_BAR_WIDTH - filled),
        summary.level_xp,
        summary.xp_for_next_level
    );

    println!(
        "  Season XP {:.0}, day {} of 60, {} days remaining",
        summary.total_xp,
        summary.season_day + 1,
        summary.days_remaining
    );
    println!("  Deep work earns 100 XP/h, shallow 50 XP/h, a goal day +200 XP");
    Ok(())
}
