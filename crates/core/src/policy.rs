//! Authorization rules for locker operations.
//!
//! Every function here is pure: relationship lookups happen in the caller,
//! which passes the outcome in. That keeps each rule testable without a
//! database and keeps the "check, then mutate" order explicit in the service.

use crate::error::CoreError;
use crate::roles::{Actor, ActorRole};
use crate::types::DbId;

/// Default look-back window for the recent-lessons report.
pub const DEFAULT_LESSON_WINDOW_DAYS: i64 = 365;

/// Message used for every relationship-based rejection.
const UNAUTHORIZED: &str = "Unauthorized";

// ---------------------------------------------------------------------------
// Locker listing
// ---------------------------------------------------------------------------

/// Whose locker a listing request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockerScope {
    /// The account is known to be visible to the actor.
    Account(DbId),
    /// An instructor asked for a student's locker; the caller must confirm
    /// an `instructor_students` row exists before listing.
    StudentOf { instructor_id: DbId, account_id: DbId },
}

impl LockerScope {
    /// Resolve the account scope for a listing.
    ///
    /// - Account holders always see their own locker; a requested account is
    ///   ignored.
    /// - Instructors see their own locker, or a student's when a relationship
    ///   is confirmed.
    /// - Agents may name any account.
    pub fn resolve(actor: &Actor, requested_account: Option<DbId>) -> Self {
        match (actor.role, requested_account) {
            (ActorRole::Student, _) | (_, None) => Self::Account(actor.account_id),
            (ActorRole::Agent, Some(account_id)) => Self::Account(account_id),
            (ActorRole::Instructor, Some(account_id)) if account_id == actor.account_id => {
                Self::Account(account_id)
            }
            (ActorRole::Instructor, Some(account_id)) => Self::StudentOf {
                instructor_id: actor.account_id,
                account_id,
            },
        }
    }

    /// The account whose swings are listed.
    pub fn account_id(&self) -> DbId {
        match *self {
            Self::Account(id) => id,
            Self::StudentOf { account_id, .. } => account_id,
        }
    }
}

/// Finish a [`LockerScope::StudentOf`] check.
///
/// A missing relationship is reported as `NotFound` so the response does not
/// reveal whether the account exists.
pub fn confirm_student_scope(account_id: DbId, has_relationship: bool) -> Result<(), CoreError> {
    if has_relationship {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: "Account",
            id: account_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Which column restricts an analysis query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisScope {
    ByInstructor(DbId),
    ByAccount(DbId),
    Unrestricted,
}

impl AnalysisScope {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            ActorRole::Instructor => Self::ByInstructor(actor.account_id),
            ActorRole::Student => Self::ByAccount(actor.account_id),
            ActorRole::Agent => Self::Unrestricted,
        }
    }
}

// ---------------------------------------------------------------------------
// Recent lessons
// ---------------------------------------------------------------------------

/// Decide which instructor a recent-lessons query runs for.
///
/// Agents may query on behalf of any instructor (defaulting to themselves);
/// instructors only for themselves; account holders are refused.
pub fn resolve_lesson_instructor(
    actor: &Actor,
    instructor_override: Option<DbId>,
) -> Result<DbId, CoreError> {
    match actor.role {
        ActorRole::Agent => Ok(instructor_override.unwrap_or(actor.account_id)),
        ActorRole::Instructor => match instructor_override {
            Some(id) if id != actor.account_id => {
                Err(CoreError::Forbidden(UNAUTHORIZED.into()))
            }
            _ => Ok(actor.account_id),
        },
        ActorRole::Student => Err(CoreError::Forbidden(UNAUTHORIZED.into())),
    }
}

/// Normalize the `daysAgo` parameter: absent or zero means one year.
pub fn lesson_window_days(days_ago: Option<i64>) -> Result<i64, CoreError> {
    match days_ago {
        None | Some(0) => Ok(DEFAULT_LESSON_WINDOW_DAYS),
        Some(days) if days < 0 => Err(CoreError::Validation(format!(
            "daysAgo must not be negative, got {days}"
        ))),
        Some(days) => Ok(days),
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Authorize assigning swings to `instructor_id`.
///
/// Allowed for agents, for the instructor themself, and for accounts with a
/// recorded relationship to that instructor.
pub fn authorize_assignment(
    actor: &Actor,
    instructor_id: DbId,
    actor_has_relationship: bool,
) -> Result<(), CoreError> {
    if actor.is_agent() || actor.account_id == instructor_id || actor_has_relationship {
        Ok(())
    } else {
        Err(CoreError::Forbidden(UNAUTHORIZED.into()))
    }
}

/// Only the owning account may upload media for a swing.
pub fn authorize_upload(actor: &Actor, owner_account_id: DbId) -> Result<(), CoreError> {
    if actor.account_id == owner_account_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the owner of a locker item may upload its video".into(),
        ))
    }
}

/// The owner or an agent may delete a locker item.
pub fn authorize_delete(actor: &Actor, owner_account_id: DbId) -> Result<(), CoreError> {
    if actor.is_agent() || actor.account_id == owner_account_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(UNAUTHORIZED.into()))
    }
}

/// The assigned instructor or an agent may record a review outcome.
pub fn authorize_review(actor: &Actor, assigned_instructor: Option<DbId>) -> Result<(), CoreError> {
    if actor.is_agent() {
        return Ok(());
    }
    match assigned_instructor {
        Some(id) if actor.is_instructor() && id == actor.account_id => Ok(()),
        _ => Err(CoreError::Forbidden(UNAUTHORIZED.into())),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_student_scope_ignores_requested_account() {
        let scope = LockerScope::resolve(&Actor::student(7), Some(99));
        assert_eq!(scope, LockerScope::Account(7));
    }

    #[test]
    fn test_instructor_without_request_sees_own_locker() {
        let scope = LockerScope::resolve(&Actor::instructor(5), None);
        assert_eq!(scope, LockerScope::Account(5));
    }

    #[test]
    fn test_instructor_requesting_student_needs_relationship() {
        let scope = LockerScope::resolve(&Actor::instructor(5), Some(12));
        assert_eq!(
            scope,
            LockerScope::StudentOf {
                instructor_id: 5,
                account_id: 12
            }
        );
        assert_eq!(scope.account_id(), 12);
    }

    #[test]
    fn test_agent_may_name_any_account() {
        assert_eq!(
            LockerScope::resolve(&Actor::agent(1), Some(44)),
            LockerScope::Account(44)
        );
    }

    #[test]
    fn test_missing_student_relationship_is_not_found() {
        assert!(confirm_student_scope(12, true).is_ok());
        assert_matches!(
            confirm_student_scope(12, false),
            Err(CoreError::NotFound { entity: "Account", id: 12 })
        );
    }

    #[test]
    fn test_analysis_scope_per_role() {
        assert_eq!(
            AnalysisScope::for_actor(&Actor::instructor(3)),
            AnalysisScope::ByInstructor(3)
        );
        assert_eq!(
            AnalysisScope::for_actor(&Actor::student(4)),
            AnalysisScope::ByAccount(4)
        );
        assert_eq!(
            AnalysisScope::for_actor(&Actor::agent(1)),
            AnalysisScope::Unrestricted
        );
    }

    #[test]
    fn test_lesson_instructor_resolution() {
        assert_eq!(resolve_lesson_instructor(&Actor::agent(1), Some(9)).unwrap(), 9);
        assert_eq!(resolve_lesson_instructor(&Actor::agent(1), None).unwrap(), 1);
        assert_eq!(resolve_lesson_instructor(&Actor::instructor(5), None).unwrap(), 5);
        assert_eq!(
            resolve_lesson_instructor(&Actor::instructor(5), Some(5)).unwrap(),
            5
        );
        assert_matches!(
            resolve_lesson_instructor(&Actor::instructor(5), Some(6)),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            resolve_lesson_instructor(&Actor::student(8), None),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_lesson_window_defaults() {
        assert_eq!(lesson_window_days(None).unwrap(), 365);
        assert_eq!(lesson_window_days(Some(0)).unwrap(), 365);
        assert_eq!(lesson_window_days(Some(30)).unwrap(), 30);
        assert_matches!(lesson_window_days(Some(-1)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_assignment_rules() {
        // Agent.
        assert!(authorize_assignment(&Actor::agent(1), 50, false).is_ok());
        // Self-assignment.
        assert!(authorize_assignment(&Actor::instructor(50), 50, false).is_ok());
        // Student with a recorded relationship.
        assert!(authorize_assignment(&Actor::student(7), 50, true).is_ok());
        // Neither.
        assert_matches!(
            authorize_assignment(&Actor::student(7), 50, false),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            authorize_assignment(&Actor::instructor(51), 50, false),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn test_upload_requires_owner() {
        assert!(authorize_upload(&Actor::student(7), 7).is_ok());
        assert_matches!(
            authorize_upload(&Actor::student(7), 8),
            Err(CoreError::Forbidden(_))
        );
        // Agents do not upload on behalf of students.
        assert!(authorize_upload(&Actor::agent(1), 7).is_err());
    }

    #[test]
    fn test_delete_rules() {
        assert!(authorize_delete(&Actor::student(7), 7).is_ok());
        assert!(authorize_delete(&Actor::agent(1), 7).is_ok());
        assert!(authorize_delete(&Actor::instructor(5), 7).is_err());
    }

    #[test]
    fn test_review_rules() {
        assert!(authorize_review(&Actor::instructor(5), Some(5)).is_ok());
        assert!(authorize_review(&Actor::agent(1), None).is_ok());
        assert!(authorize_review(&Actor::instructor(5), Some(6)).is_err());
        assert!(authorize_review(&Actor::instructor(5), None).is_err());
        assert!(authorize_review(&Actor::student(5), Some(5)).is_err());
    }
}
