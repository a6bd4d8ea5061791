use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The two kinds of tracked work. Deep work is weighted higher wherever
/// scoring is involved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkKind {
    Deep,
    Shallow,
}

impl Display for WorkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkKind::Deep => write!(f, "deep"),
            WorkKind::Shallow => write!(f, "shallow"),
        }
    }
}

/// A finished work session as stored on disk. Sessions are immutable once
/// written, the only mutation the store supports is deletion.
///
/// Wire field names match the stored document format, timestamps are
/// epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Arc<str>,
    #[serde(rename = "type")]
    pub kind: WorkKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// Active time in whole seconds, pauses excluded.
    #[serde(rename = "duration")]
    pub duration_s: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
    #[serde(rename = "pausedDuration", default)]
    pub paused_s: i64,
    #[serde(rename = "projectId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Arc<str>>,
    #[serde(default)]
    pub manual: bool,
}

impl SessionRecord {
    /// Tracked hours of this session. A record with a nonsense negative
    /// duration counts as zero so aggregation stays total over whatever is
    /// on disk.
    pub fn hours(&self) -> f64 {
        self.duration_s.max(0) as f64 / 3600.
    }
}

/// A session that finished but has not been handed to the store yet. The
/// store assigns the id when the draft is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub kind: WorkKind,
    pub start: DateTime<Utc>,
    pub duration_s: i64,
    pub end: DateTime<Utc>,
    pub paused_s: i64,
    pub project_id: Option<Arc<str>>,
    pub manual: bool,
}

impl SessionDraft {
    pub fn into_record(self, id: Arc<str>) -> SessionRecord {
        SessionRecord {
            id,
            kind: self.kind,
            start: self.start,
            duration_s: self.duration_s,
            end: self.end,
            paused_s: self.paused_s,
            project_id: self.project_id,
            manual: self.manual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Arc<str>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A tracked project. Subtasks live and die with their project, they have
/// no lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Arc<str>,
    pub name: String,
    pub deadline: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Fields of a new project the caller decides on. Everything else is filled
/// in by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub deadline: NaiveDate,
    pub description: Option<String>,
}

/// Partial project update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl Project {
    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(subtasks) = update.subtasks {
            self.subtasks = subtasks;
        }
    }
}

const DEFAULT_ATTENTION_LEVEL: u8 = 100;

fn default_attention() -> u8 {
    DEFAULT_ATTENTION_LEVEL
}

/// Per user knobs. `attention_level` is a self reported 0 to 100 gauge,
/// `dark_mode` switches the palette of colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "darkMode", default)]
    pub dark_mode: bool,
    #[serde(rename = "attentionLevel", default = "default_attention")]
    pub attention_level: u8,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            attention_level: DEFAULT_ATTENTION_LEVEL,
        }
    }
}

/// Partial settings update with merge semantics, absent fields keep their
/// stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub dark_mode: Option<bool>,
    pub attention_level: Option<u8>,
}

impl UserSettings {
    pub fn merged(self, patch: SettingsPatch) -> Self {
        Self {
            dark_mode: patch.dark_mode.unwrap_or(self.dark_mode),
            attention_level: patch.attention_level.unwrap_or(self.attention_level),
        }
    }
}
