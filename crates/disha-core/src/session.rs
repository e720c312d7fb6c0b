//! Session domain model.
//!
//! The session is the single source of truth for "who is using the
//! portal right now". It is written only by the login and sign-out
//! flows and read everywhere else, most importantly by the navigation
//! guard.

use serde::{Deserialize, Serialize};

/// The two account roles the portal knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// The string the portal uses on the wire for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

/// Who the signed-in caller is, as reported by the login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub department: String,
    pub id: String,
}

/// The authenticated state of the client.
///
/// An anonymous session carries no role and no identity, so consumers
/// cannot accidentally trust stale identity data from a signed-out
/// user. Stored sessions that fail to parse load as `Anonymous`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Anonymous,
    SignedIn { role: Role, identity: Identity },
}

impl Session {
    /// Creates a signed-in session from a login result.
    pub fn signed_in(role: Role, identity: Identity) -> Self {
        Self::SignedIn { role, identity }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    /// The caller's role, if authenticated.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::SignedIn { role, .. } => Some(*role),
        }
    }

    /// The caller's identity, if authenticated.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::SignedIn { identity, .. } => Some(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            display_name: "Asha Verma".to_string(),
            department: "Computer Science".to_string(),
            id: "CS2021-042".to_string(),
        }
    }

    #[test]
    fn anonymous_session_exposes_nothing() {
        let session = Session::Anonymous;
        assert!(!session.is_authenticated());
        assert!(session.role().is_none());
        assert!(session.identity().is_none());
    }

    #[test]
    fn signed_in_session_exposes_role_and_identity() {
        let session = Session::signed_in(Role::Student, identity());
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Student));
        assert_eq!(session.identity().unwrap().department, "Computer Science");
    }

    #[test]
    fn role_round_trips_through_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
    }
}
