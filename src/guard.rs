//! Route guard: admit-or-redirect decision run before every navigation.

use std::sync::Arc;

use crate::session::{SessionError, SessionStore};
use crate::token;

/// Static partition of navigable paths. Paths in neither list are
/// unrestricted.
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Requires a valid session.
    pub protected: Vec<String>,
    /// Must redirect away when a valid session exists (the login page).
    pub public_only: Vec<String>,
    /// Where unauthenticated clients land.
    pub entry_path: String,
    /// Where authenticated clients land.
    pub home_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            protected: ["/dashboard", "/topup", "/transaction", "/account"]
                .map(String::from)
                .to_vec(),
            public_only: vec!["/".to_string()],
            entry_path: "/".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

/// The guard's only terminal outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Navigation proceeds. The decoded subject is carried for rendering
    /// affordances only — server calls must re-verify the token.
    Admit { subject: Option<String> },
    RedirectToPublic,
    RedirectToAuthenticatedHome,
}

pub struct Guard {
    store: Arc<dyn SessionStore>,
    table: RouteTable,
}

impl Guard {
    pub fn new(store: Arc<dyn SessionStore>, table: RouteTable) -> Self {
        Self { store, table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Evaluate one navigation. Re-run on every request; a transient store
    /// failure self-heals on the next attempt.
    pub fn evaluate(&self, path: &str) -> Result<Outcome, SessionError> {
        // load() lazily clears invalid or expired tokens, so Some here
        // means a live session.
        let subject = match self.store.load()? {
            Some(raw) => token::decode(&raw).ok().map(|claims| claims.email),
            None => None,
        };

        if self.table.protected.iter().any(|p| p == path) && subject.is_none() {
            // Leave nothing stale behind before bouncing to the entry page.
            self.store.clear()?;
            tracing::debug!(path, "Unauthenticated access to protected path");
            return Ok(Outcome::RedirectToPublic);
        }

        if self.table.public_only.iter().any(|p| p == path) && subject.is_some() {
            tracing::debug!(path, "Authenticated client on public-only path");
            return Ok(Outcome::RedirectToAuthenticatedHome);
        }

        Ok(Outcome::Admit { subject })
    }
}
