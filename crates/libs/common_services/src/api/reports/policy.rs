use crate::api::reports::error::ReportError;
use crate::database::app_user::User;
use crate::database::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Read,
    Update,
    Delete,
}

/// Decides whether `caller` may perform `action` on an existing `report`.
///
/// # Errors
///
/// * `ReportError::Forbidden` when the caller lacks the rights for this report.
pub fn authorize(caller: &User, action: ReportAction, report: &Report) -> Result<(), ReportError> {
    if caller.is_admin() {
        return Ok(());
    }
    match action {
        ReportAction::Read if report.user_id == caller.id => Ok(()),
        ReportAction::Read => Err(ReportError::Forbidden(
            "Not authorized to view this report".to_owned(),
        )),
        ReportAction::Update | ReportAction::Delete => Err(ReportError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            caller.role
        ))),
    }
}

/// Owner filter applied to listings and statistics. Admins see everything.
#[must_use]
pub fn owner_scope(caller: &User) -> Option<i32> {
    (!caller.is_admin()).then_some(caller.id)
}
