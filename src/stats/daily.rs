use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};

use crate::{
    store::entities::{SessionRecord, WorkKind},
    utils::time::day_key,
};

/// Hours of tracked work within one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayTotals {
    pub deep: f64,
    pub shallow: f64,
    pub total: f64,
}

impl DayTotals {
    fn add(&mut self, kind: WorkKind, hours: f64) {
        match kind {
            WorkKind::Deep => self.deep += hours,
            WorkKind::Shallow => self.shallow += hours,
        }
        self.total = self.deep + self.shallow;
    }

    /// A day counts as hitting the goal with 6 hours of deep work or
    /// 8 hours overall. Drives both the heatmap's top band and the season
    /// bonus.
    pub fn goal_reached(&self) -> bool {
        self.deep >= 6. || self.total >= 8.
    }
}

/// Map from a calendar day to the hours tracked on it. A day with no
/// sessions is simply absent, callers default to [DayTotals::default].
pub type DailyTotals = BTreeMap<NaiveDate, DayTotals>;

/// Buckets sessions by the day they started on and sums hours per kind.
///
/// Pure and order independent, so it can be rerun on every change to the
/// session list. Records with nonsense durations contribute zero instead of
/// poisoning the totals.
pub fn aggregate_daily<Tz: TimeZone>(sessions: &[SessionRecord], tz: &Tz) -> DailyTotals {
    let mut totals = DailyTotals::new();
    for session in sessions {
        totals
            .entry(day_key(session.start, tz))
            .or_default()
            .add(session.kind, session.hours());
    }
    totals
}

/// Deep and shallow hours across every session booked on one project.
pub fn project_totals(sessions: &[SessionRecord], project_id: &str) -> DayTotals {
    let mut totals = DayTotals::default();
    for session in sessions {
        if session.project_id.as_deref() == Some(project_id) {
            totals.add(session.kind, session.hours());
        }
    }
    totals
}
