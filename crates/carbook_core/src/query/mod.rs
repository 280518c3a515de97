//! Parameterized SQL construction for vehicle queries.
//!
//! # Responsibility
//! - Assemble search, lookup and sparse-update statements.
//! - Keep caller values out of SQL text; only `VehicleField` columns appear.
//!
//! # See also
//! - `crate::model::update` for the closed field set.

pub mod builder;
