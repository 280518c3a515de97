//! Core use-case services.
//!
//! # Responsibility
//! - Expose the vehicle store operations to adapters (CLI, HTTP, ...).
//! - Keep adapters decoupled from storage details.

pub mod vehicle_service;
