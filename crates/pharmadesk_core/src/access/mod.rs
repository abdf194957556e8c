//! Role-based access gate.
//!
//! # Responsibility
//! - Decide per session user which routes are reachable and which in-page
//!   actions are permitted.
//! - Build the sidebar navigation from the same tables so menus never
//!   advertise a route the gate would refuse.
//!
//! # Invariants
//! - Deny by default: a route or permission absent from a role's table is
//!   refused.
//! - Public routes are reachable without a session.

pub mod navigation;
pub mod permission;
pub mod policy;
pub mod route;
