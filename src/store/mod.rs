//! Persistence for sessions, projects and user settings.
//! The basic idea is:
//!  - [SessionStore] is the contract the rest of the crate programs
//!    against. A remote document store would slot in behind it, the
//!    shipped realization is [local::LocalStore].
//!  - Session records are stored per UTC day as json lines, projects and
//!    settings as whole json documents.
//!  - [hub::DataHub] layers live snapshots on top, everything downstream
//!    reads those instead of touching files.

pub mod entities;
pub mod hub;
pub mod local;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use self::entities::{
    NewProject, Project, ProjectUpdate, SessionDraft, SessionRecord, SettingsPatch, UserSettings,
};

/// Gateway to wherever the user's documents live. All writes are fire and
/// forget from the caller's point of view: failures surface as plain
/// errors, nothing in here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// All stored sessions ordered by start, newest first.
    async fn load_sessions(&self) -> Result<Vec<SessionRecord>>;

    async fn create_session(&self, draft: SessionDraft) -> Result<SessionRecord>;

    /// Removes a session. Returns whether the id existed.
    async fn delete_session(&self, id: &str) -> Result<bool>;

    async fn load_projects(&self) -> Result<Vec<Project>>;

    async fn create_project(&self, new: NewProject) -> Result<Project>;

    /// Applies a partial update and returns the stored result.
    async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project>;

    async fn delete_project(&self, id: &str) -> Result<bool>;

    async fn load_settings(&self) -> Result<UserSettings>;

    /// Merges the patch into the stored settings and returns the result.
    async fn merge_settings(&self, patch: SettingsPatch) -> Result<UserSettings>;
}

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Process unique id in the shape the session documents have always used,
/// epoch milliseconds plus a sequence number.
pub(crate) fn fresh_id(now: DateTime<Utc>) -> Arc<str> {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", now.timestamp_millis()).into()
}
