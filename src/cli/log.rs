use anyhow::{anyhow, bail, Result};
use chrono::{Duration, NaiveTime, TimeZone};
use clap::Parser;

use crate::{
    store::{
        entities::{SessionDraft, WorkKind},
        local::LocalStore,
        SessionStore,
    },
    utils::time::{date_to_record_name, format_hours},
};

use super::{parse_day, DateStyle};

#[derive(Debug, Parser)]
pub struct LogCommand {
    #[arg(value_enum, help = "Kind of work the session was")]
    kind: WorkKind,
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Length of the session in minutes"
    )]
    minutes: u32,
    #[arg(
        short,
        long,
        help = "Day the session happened. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(short, long, help = "Project id to book the session on")]
    project: Option<String>,
}

pub async fn run(command: LogCommand, store: LocalStore) -> Result<()> {
    let day = parse_day(command.date, command.date_style)?;

    let project_id = match command.project {
        Some(id) => {
            let projects = store.load_projects().await?;
            let Some(project) = projects.iter().find(|v| *v.id == *id) else {
                bail!("No project with id {id}");
            };
            Some(project.id.clone())
        }
        None => None,
    };

    // Entries logged after the fact get pinned to local noon, the exact
    // moment was never recorded.
    let noon = day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    let start = chrono::Local
        .from_local_datetime(&noon)
        .earliest()
        .ok_or_else(|| anyhow!("Could not resolve local noon on {day}"))?
        .to_utc();
    let duration_s = i64::from(command.minutes) * 60;

    let record = store
        .create_session(SessionDraft {
            kind: command.kind,
            start,
            duration_s,
            end: start + Duration::seconds(duration_s),
            paused_s: 0,
            project_id,
            manual: true,
        })
        .await?;

    println!(
        "Logged a {} {} session on {} ({}).",
        format_hours(duration_s as f64 / 3600.),
        record.kind,
        date_to_record_name(day),
        record.id
    );
    Ok(())
}
