//! Role-gated navigation guard.
//!
//! Every entry into a guarded destination is decided here, from the
//! session value current at the moment of the attempt. The guard is a
//! pure function: it never mutates the session, never fails, and is
//! safe to call on every navigation event.

use crate::session::{Role, Session};

/// Navigable destinations of the portal with their stable paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    StudentLogin,
    AdminLogin,
    StudentHome,
    AdminHome,
    Dashboard,
    Notifications,
    Signup,
}

impl Route {
    /// The path string the router uses for this destination.
    pub fn path(&self) -> &'static str {
        match self {
            Route::StudentLogin => "/login/student",
            Route::AdminLogin => "/login/admin",
            Route::StudentHome => "/",
            Route::AdminHome => "/admin",
            Route::Dashboard => "/dashboard",
            Route::Notifications => "/notifications",
            Route::Signup => "/signup",
        }
    }

    /// Roles allowed to enter this destination. Empty means any
    /// authenticated caller may enter.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Route::AdminHome => &[Role::Admin],
            Route::Dashboard => &[Role::Student],
            _ => &[],
        }
    }
}

/// The guard's output: permit the navigation or redirect elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect(Route),
}

/// Decides whether the current session may enter a destination that
/// requires one of `required_roles`.
///
/// The decision order is fixed:
/// 1. Unauthenticated callers are sent to the student login.
/// 2. Authenticated callers whose role is not in a non-empty
///    requirement set are sent to their own home.
/// 3. Everyone else is allowed through.
///
/// Malformed or absent session data must be mapped to
/// `Session::Anonymous` by the store before it reaches this function,
/// so step 1 covers it.
pub fn decide(session: &Session, required_roles: &[Role]) -> Verdict {
    let Some(role) = session.role() else {
        return Verdict::Redirect(Route::StudentLogin);
    };

    if !required_roles.is_empty() && !required_roles.contains(&role) {
        return match role {
            Role::Admin => Verdict::Redirect(Route::AdminHome),
            Role::Student => Verdict::Redirect(Route::StudentHome),
        };
    }

    Verdict::Allow
}

/// Convenience wrapper that looks up the destination's own role
/// requirements.
pub fn decide_route(session: &Session, route: Route) -> Verdict {
    decide(session, route.required_roles())
}

/// Resolves the indexing root for a caller with no specific
/// destination: admins land on the admin dashboard, everyone else on
/// the student landing path (itself gated by [`decide`]).
pub fn home_for(session: &Session) -> Route {
    match session.role() {
        Some(Role::Admin) => Route::AdminHome,
        _ => Route::StudentHome,
    }
}
