use std::{io::Write as _, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::{
    store::{
        entities::{SessionRecord, WorkKind},
        hub::DataHub,
        local::LocalStore,
        SessionStore,
    },
    timer::SessionTimer,
    utils::{
        clock::Clock,
        time::{format_duration, format_hours},
    },
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
pub struct TimerCommand {
    #[arg(value_enum, default_value_t = WorkKind::Deep, help = "Kind of work to time")]
    kind: WorkKind,
    #[arg(short, long, help = "Project id to book the session on")]
    project: Option<String>,
}

pub async fn run(command: TimerCommand, store: LocalStore, clock: impl Clock) -> Result<()> {
    let hub = DataHub::load(store).await?;

    let project = match command.project {
        Some(id) => {
            let projects = hub.current_projects();
            let Some(project) = projects.iter().find(|v| *v.id == *id) else {
                bail!("No project with id {id}");
            };
            println!("Booking the session on {}.", project.name);
            Some(project.id.clone())
        }
        None => None,
    };

    let interrupted = CancellationToken::new();
    let _ = tokio::spawn(watch_for_interrupt(interrupted.clone()));

    run_session(command.kind, project, &hub, &clock, interrupted).await
}

async fn watch_for_interrupt(cancelation: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancelation.cancel();
    }
}

/// Drives the timer from stdin while repainting the elapsed readout once a
/// second. The tick only fires while the session is running, pausing or
/// leaving the loop silences it.
async fn run_session<S: SessionStore>(
    kind: WorkKind,
    project: Option<Arc<str>>,
    hub: &DataHub<S>,
    clock: &impl Clock,
    interrupted: CancellationToken,
) -> Result<()> {
    let mut timer = SessionTimer::default();
    timer.start(kind, project, clock.now())?;
    println!("Timing {kind} work. p pauses, r resumes, s stops and saves, Ctrl-C abandons.");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut next_tick = clock.instant() + TICK;

    loop {
        tokio::select! {
            // An interrupt loses the in-progress session. There is no
            // recovery file to resume from.
            _ = interrupted.cancelled() => {
                println!("\nSession abandoned, nothing was saved.");
                return Ok(());
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    println!("\nInput closed, session abandoned.");
                    return Ok(());
                };
                match line.trim() {
                    "p" if timer.is_running() => {
                        timer.pause(clock.now())?;
                        println!(
                            "Paused at {}. r resumes, s stops and saves.",
                            format_duration(timer.elapsed(clock.now()).num_seconds())
                        );
                    }
                    "r" if timer.is_paused() => {
                        timer.resume(clock.now())?;
                        next_tick = clock.instant() + TICK;
                    }
                    "s" => {
                        let draft = timer.stop(clock.now())?;
                        let record = hub.create_session(draft).await?;
                        report_saved(&record, hub);
                        return Ok(());
                    }
                    "" | "p" | "r" => {}
                    other => {
                        println!("Unknown input {other:?}. p pauses, r resumes, s stops and saves.")
                    }
                }
            }
            _ = clock.sleep_until(next_tick), if timer.is_running() => {
                next_tick += TICK;
                print!("\r{}", format_duration(timer.elapsed(clock.now()).num_seconds()));
                std::io::stdout().flush()?;
            }
        }
    }
}

fn report_saved<S: SessionStore>(record: &SessionRecord, hub: &DataHub<S>) {
    println!(
        "\nSaved {} session {} lasting {}.",
        record.kind,
        record.id,
        format_duration(record.duration_s)
    );
    if record.paused_s > 0 {
        println!("Paused for {} in between.", format_duration(record.paused_s));
    }

    let today = hub
        .current_daily()
        .get(&Local::now().date_naive())
        .copied()
        .unwrap_or_default();
    println!(
        "Today so far: {} deep, {} shallow, {} total.",
        format_hours(today.deep),
        format_hours(today.shallow),
        format_hours(today.total)
    );
}
