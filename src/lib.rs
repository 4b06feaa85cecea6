//! ppob-client - Client SDK for a PPOB billing/top-up backend
//!
//! This crate owns the client side of the session lifecycle:
//! - Bearer token decoding (no signature verification client-side)
//! - Single-slot persisted session store with lazy invalidation
//! - Auth state machine (login, registration, logout)
//! - Route guard (admit / redirect decisions per navigation)
//! - REST client with a global 401-clears-session interceptor
//! - Wallet balance, top-up, payment, and paginated history

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod guard;
pub mod profile;
pub mod session;
#[cfg(test)]
pub mod testutil;
pub mod token;
pub mod wallet;

use std::sync::Arc;

use api::Api;
use auth::Auth;
use config::Config;
use guard::Guard;
use session::SessionStore;
use wallet::Wallet;

/// Everything one client instance owns.
pub struct AppState {
    pub api: Api,
    pub auth: Auth,
    pub config: Config,
    pub guard: Guard,
    pub store: Arc<dyn SessionStore>,
    pub wallet: Wallet,
}
