//! Vehicle/owner domain model.
//!
//! # Responsibility
//! - Define the typed shapes exchanged with store callers.
//! - Derive sparse update sets from explicit optional-field patches.
//!
//! # Invariants
//! - Every vehicle references exactly one owner by `OwnerId`.
//! - Owners are identified for deduplication by their `OwnerName` pair.
//! - Query field names only come from the closed `VehicleField` set.

pub mod owner;
pub mod update;
pub mod vehicle;
