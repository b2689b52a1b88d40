//! # CyberArk Privilege Cloud authentication
//!
//! Supplies bearer tokens for Privilege Cloud API calls via the OAuth
//! client-credentials grant, caching them until they get close to expiry and
//! making sure concurrent callers share a single refresh.
//!
//! Modules:
//! - `cache` - token model and the lock-guarded `TokenManager`
//! - `sources` - the identity provider round-trip
//! - `client` - authenticated JSON requests with re-auth on 401
//! - `config` - env credentials and the YAML settings file
//! - `observability` / `server` - metrics and `/healthz`

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;


pub use crate::cache::token_manager::TokenManager;
pub use crate::errors::{ApiError, AuthError, ConfigError};
