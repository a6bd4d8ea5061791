use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::sync::watch;
use tracing::debug;

use crate::stats::daily::{aggregate_daily, DailyTotals};

use super::{
    entities::{
        NewProject, Project, ProjectUpdate, SessionDraft, SessionRecord, SettingsPatch,
        UserSettings,
    },
    SessionStore,
};

/// Live snapshots of everything the store holds.
///
/// Mutations go through the hub: it performs the store write, reloads the
/// affected list wholesale and replaces the published snapshot. The daily
/// totals are derived state, recomputed from the full session list on each
/// change rather than patched in place. Consumers either grab the latest
/// snapshot through `current_*` or hold a `subscribe_*` receiver, dropping
/// the receiver is the unsubscribe.
pub struct DataHub<S> {
    store: S,
    sessions: watch::Sender<Arc<Vec<SessionRecord>>>,
    daily: watch::Sender<Arc<DailyTotals>>,
    projects: watch::Sender<Arc<Vec<Project>>>,
    settings: watch::Sender<UserSettings>,
}

impl<S: SessionStore> DataHub<S> {
    pub async fn load(store: S) -> Result<Self> {
        let sessions = store.load_sessions().await?;
        let daily = aggregate_daily(&sessions, &Local);
        let projects = store.load_projects().await?;
        let settings = store.load_settings().await?;

        Ok(Self {
            sessions: watch::channel(Arc::new(sessions)).0,
            daily: watch::channel(Arc::new(daily)).0,
            projects: watch::channel(Arc::new(projects)).0,
            settings: watch::channel(settings).0,
            store,
        })
    }

    pub fn current_sessions(&self) -> Arc<Vec<SessionRecord>> {
        self.sessions.borrow().clone()
    }

    pub fn current_daily(&self) -> Arc<DailyTotals> {
        self.daily.borrow().clone()
    }

    pub fn current_projects(&self) -> Arc<Vec<Project>> {
        self.projects.borrow().clone()
    }

    pub fn current_settings(&self) -> UserSettings {
        *self.settings.borrow()
    }

    pub fn subscribe_sessions(&self) -> watch::Receiver<Arc<Vec<SessionRecord>>> {
        self.sessions.subscribe()
    }

    pub fn subscribe_daily(&self) -> watch::Receiver<Arc<DailyTotals>> {
        self.daily.subscribe()
    }

    pub fn subscribe_projects(&self) -> watch::Receiver<Arc<Vec<Project>>> {
        self.projects.subscribe()
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<UserSettings> {
        self.settings.subscribe()
    }

    pub async fn create_session(&self, draft: SessionDraft) -> Result<SessionRecord> {
        let record = self.store.create_session(draft).await?;
        self.refresh_sessions().await?;
        Ok(record)
    }

    pub async fn delete_session(&self, id: &str) -> Result<bool> {
        let found = self.store.delete_session(id).await?;
        if found {
            self.refresh_sessions().await?;
        }
        Ok(found)
    }

    pub async fn create_project(&self, new: NewProject) -> Result<Project> {
        let project = self.store.create_project(new).await?;
        self.refresh_projects().await?;
        Ok(project)
    }

    pub async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let project = self.store.update_project(id, update).await?;
        self.refresh_projects().await?;
        Ok(project)
    }

    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let found = self.store.delete_project(id).await?;
        if found {
            self.refresh_projects().await?;
        }
        Ok(found)
    }

    pub async fn merge_settings(&self, patch: SettingsPatch) -> Result<UserSettings> {
        let merged = self.store.merge_settings(patch).await?;
        self.settings.send_replace(merged);
        Ok(merged)
    }

    async fn refresh_sessions(&self) -> Result<()> {
        let sessions = self.store.load_sessions().await?;
        let daily = aggregate_daily(&sessions, &Local);
        debug!(
            "Publishing {} sessions across {} days",
            sessions.len(),
            daily.len()
        );
        self.sessions.send_replace(Arc::new(sessions));
        self.daily.send_replace(Arc::new(daily));
        Ok(())
    }

    async fn refresh_projects(&self) -> Result<()> {
        let projects = self.store.load_projects().await?;
        self.projects.send_replace(Arc::new(projects));
        Ok(())
    }
}
