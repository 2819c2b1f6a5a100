//! Well-known role names and the [`Actor`] passed into every locker operation.
//!
//! Role names are carried in the `role` claim of access tokens.

use crate::error::CoreError;
use crate::types::DbId;

/// A student or other plain account holder.
pub const ROLE_STUDENT: &str = "student";
/// An instructor. The instructor id is the instructor's account id.
pub const ROLE_INSTRUCTOR: &str = "instructor";
/// A privileged service agent acting on behalf of any instructor.
pub const ROLE_AGENT: &str = "agent";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_INSTRUCTOR, ROLE_AGENT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Student,
    Instructor,
    Agent,
}

impl ActorRole {
    /// Parse from the token `role` claim.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            ROLE_STUDENT => Ok(Self::Student),
            ROLE_INSTRUCTOR => Ok(Self::Instructor),
            ROLE_AGENT => Ok(Self::Agent),
            other => Err(CoreError::Forbidden(format!(
                "Unknown role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Student => ROLE_STUDENT,
            Self::Instructor => ROLE_INSTRUCTOR,
            Self::Agent => ROLE_AGENT,
        }
    }
}

/// The authenticated caller of a locker operation.
///
/// Always passed explicitly; nothing in the service layer reads an ambient
/// "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub account_id: DbId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(account_id: DbId, role: ActorRole) -> Self {
        Self { account_id, role }
    }

    pub fn student(account_id: DbId) -> Self {
        Self::new(account_id, ActorRole::Student)
    }

    pub fn instructor(account_id: DbId) -> Self {
        Self::new(account_id, ActorRole::Instructor)
    }

    pub fn agent(account_id: DbId) -> Self {
        Self::new(account_id, ActorRole::Agent)
    }

    pub fn is_agent(&self) -> bool {
        self.role == ActorRole::Agent
    }

    pub fn is_instructor(&self) -> bool {
        self.role == ActorRole::Instructor
    }
}
