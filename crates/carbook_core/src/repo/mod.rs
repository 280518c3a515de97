//! Vehicle store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the five store operations over vehicles and their owners.
//! - Isolate SQLite transactions and row mapping from service callers.
//!
//! # Invariants
//! - Owner find-or-create runs as one upsert inside the insert transaction.
//! - Multi-statement writes commit atomically or not at all.
//! - "No rows matched" and "statement failed" surface as different errors.

pub mod shared;
pub mod vehicle_repo;
