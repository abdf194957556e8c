//! Domain model shared by the gate, the fallback store and services.
//!
//! # Responsibility
//! - Define serde shapes that match the backend JSON and the stored
//!   fallback records (camelCase field names).
//! - Keep small, pure predicates (low stock, expiry, line totals) next to
//!   the data they read.
//!
//! # Invariants
//! - Stored purchase/delivery/bill records keep unknown fields in `extra`
//!   so a round trip never drops data written by another client.

pub mod customer;
pub mod lenient;
pub mod medicine;
pub mod purchase;
pub mod sale;
pub mod supplier;
pub mod user;
