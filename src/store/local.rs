use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use futures::{future, stream, Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, error, warn};

use crate::utils::{
    clock::Clock,
    time::{date_to_record_name, day_key},
};

use super::{
    entities::{
        NewProject, Project, ProjectUpdate, SessionDraft, SessionRecord, SettingsPatch,
        UserSettings,
    },
    fresh_id, SessionStore,
};

/// File backed realization of [SessionStore].
///
/// Sessions land in one json lines file per UTC calendar day under
/// `sessions/`, which keeps appends cheap and lets ranged reads open only
/// the days they care about. Projects and settings are small and change
/// rarely, they are rewritten wholesale as single documents.
pub struct LocalStore {
    sessions_dir: PathBuf,
    projects_path: PathBuf,
    settings_path: PathBuf,
    clock: Box<dyn Clock>,
}

impl LocalStore {
    pub fn new(data_dir: &Path, clock: Box<dyn Clock>) -> Result<Self, std::io::Error> {
        let sessions_dir = data_dir.join("sessions");
        std::fs::create_dir_all(&sessions_dir)?;

        Ok(Self {
            sessions_dir,
            projects_path: data_dir.join("projects.json"),
            settings_path: data_dir.join("settings.json"),
            clock,
        })
    }

    fn day_path(&self, day: NaiveDate) -> PathBuf {
        self.sessions_dir.join(date_to_record_name(day))
    }

    async fn read_day(&self, day: NaiveDate) -> Result<Vec<SessionRecord>> {
        async fn extract(path: &Path) -> Result<Vec<SessionRecord>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut records = vec![];
            while let Ok(Some(v)) = lines.next_line().await {
                match serde_json::from_str::<SessionRecord>(&v) {
                    Ok(v) => records.push(v),
                    Err(e) => {
                        // ignore illegal values. Might happen after shutdowns
                        warn!(
                            "During parsing in path {:?} found illegal json string {}:  {e}",
                            path, &v
                        )
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(records)
        }

        match extract(&self.day_path(day)).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn append_to_day(&self, day: NaiveDate, record: &SessionRecord) -> Result<()> {
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(self.day_path(day))
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = async {
            let mut buffer = serde_json::to_vec(record)?;
            buffer.push(b'\n');
            file.write_all(&buffer).await?;
            file.flush().await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        file.unlock_async().await?;
        result
    }

    /// Every day that currently has a record file, in no particular order.
    async fn stored_days(&self) -> Result<Vec<NaiveDate>> {
        let mut days = vec![];
        let mut entries = tokio::fs::read_dir(&self.sessions_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match NaiveDate::parse_from_str(&name, "%Y-%m-%d") {
                Ok(day) => days.push(day),
                Err(_) => warn!("Ignoring unexpected file {name} in the sessions directory"),
            }
        }
        Ok(days)
    }

    /// Streams stored sessions whose day key in `tz` falls between `from`
    /// and `to`, both inclusive. Day files are read a few at a time. The
    /// file scan is widened by a day on each side because the file layout
    /// follows UTC days while the requested keys may not.
    pub fn load_between<'a, Tz: chrono::TimeZone + 'a>(
        &'a self,
        from: NaiveDate,
        to: NaiveDate,
        tz: &'a Tz,
    ) -> impl Stream<Item = Result<SessionRecord>> + 'a {
        let scan_from = from.pred_opt().expect("Start of time should never happen");
        let scan_to = to.succ_opt().expect("End of time should never happen");

        let files = date_range(scan_from, scan_to)
            .map(move |day| async move { (day, self.read_day(day).await) })
            .buffered(4);

        files
            .flat_map(|(day, data)| match data {
                Ok(data) => stream::iter(data).map(Ok).boxed(),
                Err(e) => {
                    error!("Failed to read day file {day} {e}");
                    stream::once(future::ready(Err(e))).boxed()
                }
            })
            .filter(move |v| {
                future::ready(match v {
                    Ok(record) => {
                        let key = day_key(record.start, tz);
                        from <= key && key <= to
                    }
                    Err(_) => true,
                })
            })
    }

    async fn read_document<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        tokio::fs::write(path, serde_json::to_vec_pretty(value)?).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn load_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut days = self.stored_days().await?;
        days.sort();

        let mut sessions = vec![];
        for day in days {
            sessions.extend(self.read_day(day).await?);
        }
        sessions.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(sessions)
    }

    async fn create_session(&self, draft: SessionDraft) -> Result<SessionRecord> {
        let record = draft.into_record(fresh_id(self.clock.now()));
        self.append_to_day(record.start.date_naive(), &record).await?;
        Ok(record)
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        for day in self.stored_days().await? {
            let records = self.read_day(day).await?;
            if !records.iter().any(|v| &*v.id == id) {
                continue;
            }

            let remaining = records
                .into_iter()
                .filter(|v| &*v.id != id)
                .collect::<Vec<_>>();
            let path = self.day_path(day);
            if remaining.is_empty() {
                tokio::fs::remove_file(&path).await?;
            } else {
                let mut buffer = Vec::<u8>::new();
                for record in &remaining {
                    serde_json::to_writer(&mut buffer, record)?;
                    buffer.push(b'\n');
                }
                tokio::fs::write(&path, buffer).await?;
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn load_projects(&self) -> Result<Vec<Project>> {
        self.read_document(&self.projects_path).await
    }

    async fn create_project(&self, new: NewProject) -> Result<Project> {
        let now = self.clock.now();
        let project = Project {
            id: fresh_id(now),
            name: new.name,
            deadline: new.deadline,
            description: new.description,
            completed: false,
            created_at: now,
            subtasks: vec![],
        };

        let mut projects = self.load_projects().await?;
        projects.push(project.clone());
        self.write_document(&self.projects_path, &projects).await?;
        Ok(project)
    }

    async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let mut projects = self.load_projects().await?;
        let project = projects
            .iter_mut()
            .find(|v| &*v.id == id)
            .ok_or_else(|| anyhow!("No project with id {id}"))?;
        project.apply(update);
        let updated = project.clone();
        self.write_document(&self.projects_path, &projects).await?;
        Ok(updated)
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        let mut projects = self.load_projects().await?;
        let before = projects.len();
        projects.retain(|v| &*v.id != id);
        if projects.len() == before {
            return Ok(false);
        }
        self.write_document(&self.projects_path, &projects).await?;
        Ok(true)
    }

    async fn load_settings(&self) -> Result<UserSettings> {
        self.read_document(&self.settings_path).await
    }

    async fn merge_settings(&self, patch: SettingsPatch) -> Result<UserSettings> {
        let merged = self.load_settings().await?.merged(patch);
        self.write_document(&self.settings_path, &merged).await?;
        Ok(merged)
    }
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold((start, end), |(mut current, end)| {
        future::ready({
            if current <= end {
                let last_current = current;
                current = current.succ_opt().expect("End of time should never happen");
                Some((last_current, (current, end)))
            } else {
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use futures::TryStreamExt;
    use tempfile::tempdir;

    use super::LocalStore;
    use crate::{
        store::{
            entities::{NewProject, ProjectUpdate, SessionDraft, SettingsPatch, WorkKind},
            SessionStore,
        },
        utils::{clock::SystemClock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(), NaiveTime::MIN);

    fn store(dir: &std::path::Path) -> LocalStore {
        LocalStore::new(dir, Box::new(SystemClock)).unwrap()
    }

    fn draft(kind: WorkKind, start: DateTime<Utc>, duration_s: i64) -> SessionDraft {
        SessionDraft {
            kind,
            start,
            duration_s,
            end: start + Duration::seconds(duration_s),
            paused_s: 0,
            project_id: None,
            manual: false,
        }
    }

    fn noon(day_offset: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::days(day_offset) + Duration::hours(12)
    }

    #[tokio::test]
    async fn test_sessions_round_trip_newest_first() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        store.create_session(draft(WorkKind::Deep, noon(0), 3600)).await?;
        store
            .create_session(draft(WorkKind::Shallow, noon(1), 1800))
            .await?;
        store
            .create_session(draft(WorkKind::Deep, noon(1) + Duration::hours(3), 600))
            .await?;

        let sessions = store.load_sessions().await?;
        assert_eq!(sessions.len(), 3);
        assert!(sessions.windows(2).all(|w| w[0].start >= w[1].start));

        // One file per calendar day.
        let files = std::fs::read_dir(dir.path().join("sessions"))?.count();
        assert_eq!(files, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_session_rewrites_its_day() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        let keep = store
            .create_session(draft(WorkKind::Deep, noon(0), 3600))
            .await?;
        let gone = store
            .create_session(draft(WorkKind::Shallow, noon(0), 600))
            .await?;

        assert!(store.delete_session(&gone.id).await?);
        assert!(!store.delete_session(&gone.id).await?);

        let sessions = store.load_sessions().await?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, keep.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_the_last_session_removes_the_day_file() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        let only = store
            .create_session(draft(WorkKind::Deep, noon(0), 3600))
            .await?;
        assert!(store.delete_session(&only.id).await?);

        let files = std::fs::read_dir(dir.path().join("sessions"))?.count();
        assert_eq!(files, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        let record = store
            .create_session(draft(WorkKind::Deep, noon(0), 3600))
            .await?;

        let path = dir
            .path()
            .join("sessions")
            .join(record.start.date_naive().format("%Y-%m-%d").to_string());
        let mut content = std::fs::read_to_string(&path)?;
        content.push_str("{\"cut off in the mid");
        std::fs::write(&path, content)?;

        let sessions = store.load_sessions().await?;
        assert_eq!(sessions.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_between_filters_by_day_key() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        for offset in 0..4 {
            store
                .create_session(draft(WorkKind::Deep, noon(offset), 3600))
                .await?;
        }

        let from = TEST_START_DATE.date() + Duration::days(1);
        let to = TEST_START_DATE.date() + Duration::days(2);
        let loaded = store
            .load_between(from, to, &Utc)
            .try_collect::<Vec<_>>()
            .await?;

        assert_eq!(loaded.len(), 2);
        assert!(loaded
            .iter()
            .all(|v| { (from..=to).contains(&v.start.date_naive()) }));
        Ok(())
    }

    #[tokio::test]
    async fn test_projects_crud() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        let project = store
            .create_project(NewProject {
                name: "thesis".into(),
                deadline: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                description: None,
            })
            .await?;
        assert!(!project.completed);

        let updated = store
            .update_project(
                &project.id,
                ProjectUpdate {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        assert!(updated.completed);

        let projects = store.load_projects().await?;
        assert_eq!(projects.len(), 1);
        assert!(projects[0].completed);

        assert!(store.delete_project(&project.id).await?);
        assert!(!store.delete_project(&project.id).await?);
        assert!(store.load_projects().await?.is_empty());

        assert!(store
            .update_project(&project.id, ProjectUpdate::default())
            .await
            .is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_settings_default_and_merge() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store(dir.path());

        let settings = store.load_settings().await?;
        assert!(!settings.dark_mode);
        assert_eq!(settings.attention_level, 100);

        let merged = store
            .merge_settings(SettingsPatch {
                attention_level: Some(40),
                ..Default::default()
            })
            .await?;
        assert_eq!(merged.attention_level, 40);

        let merged = store
            .merge_settings(SettingsPatch {
                dark_mode: Some(true),
                ..Default::default()
            })
            .await?;
        assert!(merged.dark_mode);
        assert_eq!(merged.attention_level, 40);
        Ok(())
    }
}
