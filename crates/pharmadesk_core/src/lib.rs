//! Core domain logic for the PharmaDesk pharmacy client.
//! This crate is the single source of truth for the access gate, the
//! session and the local fallback data layer.

pub mod access;
pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod store;

pub use access::navigation::{navigation_for, NavItem, NavSection};
pub use access::permission::Permission;
pub use access::policy::{
    decide, landing_route, reachable_routes, require_permission, require_route, AccessDecision,
    AccessError,
};
pub use access::route::Route;
pub use backend::{Backend, BackendError, HttpBackend, LoginOutcome, OfflineBackend};
pub use config::{ClientConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{Role, SessionUser};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::{ServiceError, ServiceResult};
pub use session::{LoginProgress, Session, SessionError, SessionState};
pub use store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
