//! cachex is a response-caching and session-management middleware core
//! for [Actix Web](https://crates.io/crates/actix-web).
//!
//! The [`cache`] module provides an HTTP response cache with ETag
//! revalidation and `Cache-Control` directive assembly; [`session`] and
//! [`state`] provide signed, backend-agnostic session and one-shot
//! OAuth state management; [`backend`] is the pluggable storage layer
//! all three share; [`security`] is the HMAC/constant-time primitive
//! layer underneath them; [`monitor`] exposes read-only introspection
//! routes over whatever backend is configured.

pub mod backend;
pub mod cache;
pub mod error;
pub mod monitor;
pub mod security;
pub mod session;
pub mod state;

#[cfg(feature = "macros")]
pub mod macros {
    pub use cachex_codegen::*;
}

pub use error::{Error, Result};
#[cfg(feature = "macros")]
pub use macros::cached;

pub use cache::{CacheConfig, CacheLayer};
pub use security::SecurityManager;
pub use session::{Session, SessionManager};
pub use state::StateManager;
