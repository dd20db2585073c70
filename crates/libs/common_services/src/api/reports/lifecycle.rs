use crate::database::report::{Report, ReportPriority, ReportStatus};
use chrono::{DateTime, Utc};

/// The admin-mutable fields of a report. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportChanges {
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
    /// Trimmed; an empty string clears the notes.
    pub admin_notes: Option<String>,
}

/// Applies `changes` to `report` on behalf of admin `actor_id` at time `now`.
///
/// Entering `Cleaned` from any other status attributes the report to the actor and
/// stamps the resolution time if it was never stamped. Leaving `Cleaned` keeps both.
pub fn apply_changes(
    report: &mut Report,
    changes: ReportChanges,
    actor_id: i32,
    now: DateTime<Utc>,
) {
    if let Some(status) = changes.status {
        if status == ReportStatus::Cleaned && report.status != ReportStatus::Cleaned {
            report.resolved_by = Some(actor_id);
            if report.resolved_at.is_none() {
                report.resolved_at = Some(now);
            }
        }
        report.status = status;
    }
    if let Some(priority) = changes.priority {
        report.priority = priority;
    }
    if let Some(notes) = changes.admin_notes {
        let notes = notes.trim();
        report.admin_notes = (!notes.is_empty()).then(|| notes.to_owned());
    }
    report.updated_at = now;
}
