use ansi_term::Colour;
use anyhow::{anyhow, bail, Result};
use chrono::{Local, Utc};
use clap::Subcommand;

use crate::{
    stats::daily::project_totals,
    store::{
        entities::{NewProject, Project, ProjectUpdate, Subtask},
        fresh_id,
        local::LocalStore,
        SessionStore,
    },
    utils::time::{date_to_record_name, format_hours},
};

use super::{parse_day, DateStyle};

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    #[command(about = "List projects with their tracked hours")]
    List {
        #[arg(long, help = "Include completed projects")]
        all: bool,
    },
    #[command(about = "Add a project")]
    Add {
        name: String,
        #[arg(
            short = 'e',
            long,
            help = "Deadline. Examples are \"30/09/2026\", \"next friday\""
        )]
        deadline: String,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
        #[arg(short = 'D', long, help = "Free form description")]
        description: Option<String>,
    },
    #[command(about = "Mark a project completed")]
    Done { id: String },
    #[command(about = "Reopen a completed project")]
    Reopen { id: String },
    #[command(about = "Delete a project and its subtasks")]
    Delete { id: String },
    #[command(subcommand, about = "Manage a project's subtasks")]
    Task(TaskCommand),
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    #[command(about = "Add a subtask to a project")]
    Add { project_id: String, text: String },
    #[command(about = "Flip a subtask between done and open")]
    Toggle { project_id: String, task_id: String },
    #[command(about = "Remove a subtask from a project")]
    Delete { project_id: String, task_id: String },
}

pub async fn run(command: ProjectsCommand, store: LocalStore) -> Result<()> {
    match command {
        ProjectsCommand::List { all } => list(all, store).await,
        ProjectsCommand::Add {
            name,
            deadline,
            date_style,
            description,
        } => {
            let deadline = parse_day(Some(deadline), date_style)?;
            let project = store
                .create_project(NewProject {
                    name,
                    deadline,
                    description,
                })
                .await?;
            println!(
                "Added project {} ({}), due {}.",
                project.name,
                project.id,
                date_to_record_name(project.deadline)
            );
            Ok(())
        }
        ProjectsCommand::Done { id } => {
            let project = set_completed(&id, true, &store).await?;
            println!("Completed {}.", project.name);
            Ok(())
        }
        ProjectsCommand::Reopen { id } => {
            let project = set_completed(&id, false, &store).await?;
            println!("Reopened {}.", project.name);
            Ok(())
        }
        ProjectsCommand::Delete { id } => {
            if store.delete_project(&id).await? {
                println!("Deleted project {id}.");
                Ok(())
            } else {
                bail!("No project with id {id}");
            }
        }
        ProjectsCommand::Task(command) => task(command, store).await,
    }
}

async fn list(all: bool, store: LocalStore) -> Result<()> {
    let projects = store.load_projects().await?;
    let sessions = store.load_sessions().await?;
    let today = Local::now().date_naive();

    let mut shown = 0;
    for project in projects.iter().filter(|v| all || !v.completed) {
        shown += 1;
        let marker = if project.completed { "[x]" } else { "[ ]" };
        let deadline = date_to_record_name(project.deadline);
        let deadline = if project.deadline < today && !project.completed {
            Colour::Red.paint(format!("{deadline}, overdue")).to_string()
        } else {
            deadline
        };
        println!(
            "{marker} {}  due {deadline}  ({})",
            ansi_term::Style::new().bold().paint(&project.name),
            project.id
        );
        if let Some(description) = &project.description {
            println!("      {description}");
        }

        let hours = project_totals(&sessions, &project.id);
        if hours.total > 0. {
            println!(
                "      {} deep, {} shallow, {} total",
                format_hours(hours.deep),
                format_hours(hours.shallow),
                format_hours(hours.total)
            );
        }
        for task in &project.subtasks {
            let check = if task.completed { 'x' } else { ' ' };
            println!("      [{check}] {}  ({})", task.text, task.id);
        }
    }

    if shown == 0 {
        println!("No open projects.");
    }
    Ok(())
}

async fn set_completed(id: &str, completed: bool, store: &LocalStore) -> Result<Project> {
    store
        .update_project(
            id,
            ProjectUpdate {
                completed: Some(completed),
                ..Default::default()
            },
        )
        .await
}

async fn task(command: TaskCommand, store: LocalStore) -> Result<()> {
    match command {
        TaskCommand::Add { project_id, text } => {
            let mut subtasks = subtasks_of(&project_id, &store).await?;
            subtasks.push(Subtask {
                id: fresh_id(Utc::now()),
                text: text.clone(),
                completed: false,
            });
            save_subtasks(&project_id, subtasks, &store).await?;
            println!("Added subtask {text:?}.");
        }
        TaskCommand::Toggle {
            project_id,
            task_id,
        } => {
            let mut subtasks = subtasks_of(&project_id, &store).await?;
            let task = subtasks
                .iter_mut()
                .find(|v| *v.id == *task_id)
                .ok_or_else(|| anyhow!("No subtask with id {task_id}"))?;
            task.completed = !task.completed;
            let state = if task.completed { "done" } else { "open" };
            let text = task.text.clone();
            save_subtasks(&project_id, subtasks, &store).await?;
            println!("Marked {text:?} as {state}.");
        }
        TaskCommand::Delete {
            project_id,
            task_id,
        } => {
            let mut subtasks = subtasks_of(&project_id, &store).await?;
            let before = subtasks.len();
            subtasks.retain(|v| *v.id != *task_id);
            if subtasks.len() == before {
                bail!("No subtask with id {task_id}");
            }
            save_subtasks(&project_id, subtasks, &store).await?;
            println!("Deleted subtask {task_id}.");
        }
    }
    Ok(())
}

async fn subtasks_of(project_id: &str, store: &LocalStore) -> Result<Vec<Subtask>> {
    let projects = store.load_projects().await?;
    let project = projects
        .iter()
        .find(|v| *v.id == *project_id)
        .ok_or_else(|| anyhow!("No project with id {project_id}"))?;
    Ok(project.subtasks.clone())
}

async fn save_subtasks(project_id: &str, subtasks: Vec<Subtask>, store: &LocalStore) -> Result<()> {
    store
        .update_project(
            project_id,
            ProjectUpdate {
                subtasks: Some(subtasks),
                ..Default::default()
            },
        )
        .await?;
    Ok(())
}
