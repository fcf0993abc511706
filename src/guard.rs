//! Navigation guard: per-route authorization decisions.
//!
//! DESIGN
//! ======
//! The view layer declares a static table of destinations with requirement
//! flags; `decide` is a pure function of (target requirement, table, session
//! snapshot) evaluated before each transition completes. First matching
//! rule wins, and no session state is mutated here.

use crate::session::SessionSnapshot;

/// Declared requirements for one navigation destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Stable destination identifier, also used as a redirect target.
    pub destination: String,
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteRequirement {
    /// Open to everyone.
    #[must_use]
    pub fn public(destination: impl Into<String>) -> Self {
        Self { destination: destination.into(), requires_auth: false, requires_admin: false }
    }

    /// Requires an authenticated session.
    #[must_use]
    pub fn authenticated(destination: impl Into<String>) -> Self {
        Self { destination: destination.into(), requires_auth: true, requires_admin: false }
    }

    /// Requires an authenticated session with the admin role.
    #[must_use]
    pub fn admin_only(destination: impl Into<String>) -> Self {
        Self { destination: destination.into(), requires_auth: true, requires_admin: true }
    }
}

/// The view layer's declared destinations plus the two redirect targets.
/// Built once at startup; read-only afterwards.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteRequirement>,
    login: String,
    default_authenticated: String,
}

impl RouteTable {
    #[must_use]
    pub fn new(
        routes: Vec<RouteRequirement>,
        login: impl Into<String>,
        default_authenticated: impl Into<String>,
    ) -> Self {
        Self { routes, login: login.into(), default_authenticated: default_authenticated.into() }
    }

    /// Look up the declared requirement for a destination.
    #[must_use]
    pub fn requirement(&self, destination: &str) -> Option<&RouteRequirement> {
        self.routes.iter().find(|r| r.destination == destination)
    }

    #[must_use]
    pub fn login_destination(&self) -> &str {
        &self.login
    }

    #[must_use]
    pub fn default_destination(&self) -> &str {
        &self.default_authenticated
    }
}

/// Resolution of one pending navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Continue to the requested destination unchanged.
    Proceed,
    /// Divert to the login destination.
    RedirectToLogin,
    /// Soft downgrade to the default authenticated destination.
    RedirectToDefault,
}

impl GuardDecision {
    /// The concrete destination the host should navigate to.
    #[must_use]
    pub fn target<'t>(&self, table: &'t RouteTable, requested: &'t str) -> &'t str {
        match self {
            Self::Proceed => requested,
            Self::RedirectToLogin => table.login_destination(),
            Self::RedirectToDefault => table.default_destination(),
        }
    }
}

/// Decide one navigation attempt. Evaluated in order; first match wins.
///
/// 1. Needs auth, session unauthenticated — go log in.
/// 2. Needs admin, current role is not admin — downgrade to the default
///    destination rather than an error page.
/// 3. Heading to login while already authenticated — back to the default
///    destination.
/// 4. Otherwise proceed.
#[must_use]
pub fn decide(
    target: &RouteRequirement,
    table: &RouteTable,
    session: &SessionSnapshot,
) -> GuardDecision {
    if target.requires_auth && !session.authenticated {
        return GuardDecision::RedirectToLogin;
    }
    if target.requires_admin && !session.is_admin() {
        return GuardDecision::RedirectToDefault;
    }
    if target.destination == table.login_destination() && session.authenticated {
        return GuardDecision::RedirectToDefault;
    }
    GuardDecision::Proceed
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
