use std::collections::BTreeMap;

use ansi_term::Colour;
use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::{
    store::{
        entities::{SessionRecord, WorkKind},
        local::LocalStore,
        SessionStore,
    },
    utils::time::{day_key, format_duration},
};

use super::{parse_day, DateStyle};

#[derive(Debug, Parser)]
pub struct HistoryCommand {
    #[command(subcommand)]
    action: Option<HistoryAction>,
    #[arg(short, long, value_enum, help = "Only show sessions of this kind")]
    kind: Option<WorkKind>,
    #[arg(
        short,
        long,
        help = "Only show sessions of one day. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Subcommand)]
enum HistoryAction {
    #[command(about = "Delete a session by id")]
    Delete { id: String },
}

pub async fn run(command: HistoryCommand, store: LocalStore) -> Result<()> {
    if let Some(HistoryAction::Delete { id }) = command.action {
        return delete(&id, store).await;
    }
    list(command, store).await
}

async fn delete(id: &str, store: LocalStore) -> Result<()> {
    if store.delete_session(id).await? {
        println!("Deleted session {id}.");
        Ok(())
    } else {
        bail!("No session with id {id}");
    }
}

async fn list(command: HistoryCommand, store: LocalStore) -> Result<()> {
    let only_day = match command.date {
        Some(v) => Some(parse_day(Some(v), command.date_style)?),
        None => None,
    };

    let sessions = store.load_sessions().await?;
    let mut grouped: BTreeMap<NaiveDate, Vec<&SessionRecord>> = BTreeMap::new();
    for session in &sessions {
        if matches!(command.kind, Some(kind) if kind != session.kind) {
            continue;
        }
        let day = day_key(session.start, &Local);
        if matches!(only_day, Some(v) if v != day) {
            continue;
        }
        grouped.entry(day).or_default().push(session);
    }

    if grouped.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    for (day, sessions) in grouped.iter().rev() {
        println!("{}", ansi_term::Style::new().bold().paint(describe_day(*day, today)));
        for session in sessions {
            let kind = match session.kind {
                WorkKind::Deep => Colour::Green.paint("deep   "),
                WorkKind::Shallow => Colour::Purple.paint("shallow"),
            };
            let mut notes = vec![];
            if session.paused_s > 0 {
                notes.push(format!("paused {}", format_duration(session.paused_s)));
            }
            if session.manual {
                notes.push("manual".to_string());
            }
            if let Some(project) = &session.project_id {
                notes.push(format!("project {project}"));
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!("({}) ", notes.join(", "))
            };
            println!(
                "  {}  {kind}  {}  {notes}[{}]",
                session.start.with_timezone(&Local).format("%H:%M"),
                format_duration(session.duration_s),
                session.id
            );
        }
        println!();
    }
    Ok(())
}

/// Humanized day heading, recent days relative to today.
fn describe_day(day: NaiveDate, today: NaiveDate) -> String {
    match (today - day).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        gone @ 2..7 => format!("{gone} days ago"),
        _ => day.format("%A %-d %B %Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::describe_day;

    #[test]
    fn test_describe_day() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let at = |d: u32| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();

        assert_eq!(describe_day(at(10), today), "Today");
        assert_eq!(describe_day(at(9), today), "Yesterday");
        assert_eq!(describe_day(at(5), today), "5 days ago");
        assert_eq!(describe_day(at(4), today), "6 days ago");
        assert_eq!(describe_day(at(3), today), "Monday 3 March 2025");
        // Days in the future fall back to the full date too.
        assert_eq!(describe_day(at(12), today), "Wednesday 12 March 2025");
    }
}
