use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use futures::TryStreamExt;

use crate::{
    stats::{
        daily::aggregate_daily,
        heatmap::{Shade, HEATMAP_DAYS},
    },
    store::{local::LocalStore, SessionStore},
    utils::time::last_n_days,
};

const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub async fn run(store: LocalStore) -> Result<()> {
    let settings = store.load_settings().await?;
    let today = Local::now().date_naive();
    let days = last_n_days(today, HEATMAP_DAYS);

    let sessions = store
        .load_between(days[0], today, &Local)
        .try_collect::<Vec<_>>()
        .await?;
    let daily = aggregate_daily(&sessions, &Local);

    let weeks = into_weeks(&days);

    println!("Last 10 months");
    println!("{}", month_labels(&weeks));
    for row in 0..7 {
        let label = if row % 2 == 1 { DAY_LABELS[row] } else { "" };
        print!("{label:>3} ");
        for week in &weeks {
            match week[row] {
                Some(day) => {
                    let totals = daily.get(&day).copied().unwrap_or_default();
                    let colour = Shade::for_day(&totals).colour(settings.dark_mode);
                    print!("{}", colour.paint("■ "));
                }
                None => print!("  "),
            }
        }
        println!();
    }

    print!("    less ");
    for shade in [
        Shade::Empty,
        Shade::Scant,
        Shade::Low,
        Shade::Medium,
        Shade::Good,
        Shade::Optimal,
    ] {
        print!("{}", shade.colour(settings.dark_mode).paint("■ "));
    }
    println!("more");
    Ok(())
}

/// Groups consecutive days into Sunday started columns, the first and last
/// week padded with empty cells.
fn into_weeks(days: &[NaiveDate]) -> Vec<[Option<NaiveDate>; 7]> {
    let mut weeks = vec![];
    let mut current: [Option<NaiveDate>; 7] = [None; 7];
    let mut filled = false;

    for day in days {
        let slot = day.weekday().num_days_from_sunday() as usize;
        if slot == 0 && filled {
            weeks.push(current);
            current = [None; 7];
            filled = false;
        }
        current[slot] = Some(*day);
        filled = true;
    }
    if filled {
        weeks.push(current);
    }
    weeks
}

/// A header line marking every week that contains the first of a month.
fn month_labels(weeks: &[[Option<NaiveDate>; 7]]) -> String {
    let mut labels = vec![' '; weeks.len() * 2 + 4];
    for (index, week) in weeks.iter().enumerate() {
        let Some(first_of_month) = week.iter().flatten().find(|day| day.day() == 1) else {
            continue;
        };
        for (offset, c) in first_of_month.format("%b").to_string().chars().enumerate() {
            labels[index * 2 + offset] = c;
        }
    }
    format!("    {}", labels.into_iter().collect::<String>())
}
