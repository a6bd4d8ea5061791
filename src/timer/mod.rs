//! The live session timer. A plain three state machine, deliberately
//! ignorant of wall clocks and persistence: every transition is handed the
//! current moment, and stopping yields a draft for the store to keep.
//! A process dying mid session simply loses that session.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};

use crate::store::entities::{SessionDraft, WorkKind};

/// Timer states. The work kind is fixed at `start` and cannot change until
/// the machine is idle again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionTimer {
    #[default]
    Idle,
    Running {
        kind: WorkKind,
        started: DateTime<Utc>,
        paused_total: Duration,
        project: Option<Arc<str>>,
    },
    Paused {
        kind: WorkKind,
        started: DateTime<Utc>,
        paused_total: Duration,
        pause_started: DateTime<Utc>,
        project: Option<Arc<str>>,
    },
}

impl SessionTimer {
    pub fn start(
        &mut self,
        kind: WorkKind,
        project: Option<Arc<str>>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !matches!(self, SessionTimer::Idle) {
            bail!("a session is already being timed");
        }
        *self = SessionTimer::Running {
            kind,
            started: now,
            paused_total: Duration::zero(),
            project,
        };
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        let SessionTimer::Running {
            kind,
            started,
            paused_total,
            project,
        } = self.clone()
        else {
            bail!("only a running session can be paused");
        };
        *self = SessionTimer::Paused {
            kind,
            started,
            paused_total,
            pause_started: now,
            project,
        };
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        let SessionTimer::Paused {
            kind,
            started,
            paused_total,
            pause_started,
            project,
        } = self.clone()
        else {
            bail!("only a paused session can be resumed");
        };
        *self = SessionTimer::Running {
            kind,
            started,
            paused_total: paused_total + (now - pause_started),
            project,
        };
        Ok(())
    }

    /// Finishes the session and resets the timer. Allowed while running and
    /// while paused, an open pause interval is excluded from the duration.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<SessionDraft> {
        let (kind, started, paused_total, project) = match self.clone() {
            SessionTimer::Running {
                kind,
                started,
                paused_total,
                project,
            } => (kind, started, paused_total, project),
            SessionTimer::Paused {
                kind,
                started,
                paused_total,
                pause_started,
                project,
            } => (kind, started, paused_total + (now - pause_started), project),
            SessionTimer::Idle => bail!("no session is being timed"),
        };

        *self = SessionTimer::Idle;

        Ok(SessionDraft {
            kind,
            start: started,
            duration_s: (now - started - paused_total).num_seconds().max(0),
            end: now,
            paused_s: paused_total.num_seconds().max(0),
            project_id: project,
            manual: false,
        })
    }

    /// Active time so far. Frozen while paused, zero while idle.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self {
            SessionTimer::Idle => Duration::zero(),
            SessionTimer::Running {
                started,
                paused_total,
                ..
            } => now - *started - *paused_total,
            SessionTimer::Paused {
                started,
                paused_total,
                pause_started,
                ..
            } => *pause_started - *started - *paused_total,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionTimer::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SessionTimer::Paused { .. })
    }

    pub fn kind(&self) -> Option<WorkKind> {
        match self {
            SessionTimer::Idle => None,
            SessionTimer::Running { kind, .. } | SessionTimer::Paused { kind, .. } => Some(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use super::SessionTimer;
    use crate::store::entities::WorkKind;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(), NaiveTime::MIN);

    fn base() -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE)
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        base() + Duration::seconds(seconds)
    }

    #[test]
    fn test_pause_is_excluded_from_duration() {
        let mut timer = SessionTimer::default();
        timer.start(WorkKind::Deep, None, at(0)).unwrap();
        timer.pause(at(10)).unwrap();
        timer.resume(at(15)).unwrap();
        let draft = timer.stop(at(20)).unwrap();

        assert_eq!(draft.duration_s, 15);
        assert_eq!(draft.paused_s, 5);
        assert_eq!(draft.kind, WorkKind::Deep);
        assert_eq!(draft.start, at(0));
        assert_eq!(draft.end, at(20));
        assert!(!draft.manual);
        assert_eq!(timer, SessionTimer::Idle);
    }

    #[test]
    fn test_stop_while_paused_closes_the_pause() {
        let mut timer = SessionTimer::default();
        timer.start(WorkKind::Shallow, None, at(0)).unwrap();
        timer.pause(at(10)).unwrap();
        let draft = timer.stop(at(25)).unwrap();

        assert_eq!(draft.duration_s, 10);
        assert_eq!(draft.paused_s, 15);
        assert_eq!(timer, SessionTimer::Idle);
    }

    #[test]
    fn test_subsecond_times_floor() {
        let mut timer = SessionTimer::default();
        timer
            .start(WorkKind::Deep, None, base() + Duration::milliseconds(0))
            .unwrap();
        let draft = timer.stop(base() + Duration::milliseconds(20_700)).unwrap();
        assert_eq!(draft.duration_s, 20);
    }

    #[test]
    fn test_elapsed_freezes_while_paused() {
        let mut timer = SessionTimer::default();
        timer.start(WorkKind::Deep, None, at(0)).unwrap();
        assert_eq!(timer.elapsed(at(7)), Duration::seconds(7));

        timer.pause(at(10)).unwrap();
        assert_eq!(timer.elapsed(at(100)), Duration::seconds(10));

        timer.resume(at(110)).unwrap();
        assert_eq!(timer.elapsed(at(115)), Duration::seconds(15));
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut timer = SessionTimer::default();
        assert!(timer.pause(at(0)).is_err());
        assert!(timer.resume(at(0)).is_err());
        assert!(timer.stop(at(0)).is_err());

        timer.start(WorkKind::Deep, None, at(0)).unwrap();
        assert!(timer.start(WorkKind::Shallow, None, at(1)).is_err());
        assert!(timer.resume(at(1)).is_err());
        assert_eq!(timer.kind(), Some(WorkKind::Deep));

        timer.pause(at(2)).unwrap();
        assert!(timer.pause(at(3)).is_err());
        assert!(timer.is_paused());
    }

    #[test]
    fn test_project_is_carried_through() {
        let mut timer = SessionTimer::default();
        timer
            .start(WorkKind::Deep, Some("p1".into()), at(0))
            .unwrap();
        let draft = timer.stop(at(60)).unwrap();
        assert_eq!(draft.project_id.as_deref(), Some("p1"));
    }
}
