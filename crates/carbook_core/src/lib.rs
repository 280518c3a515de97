//! Data-access core for the vehicle registry.
//! Owns vehicle/owner persistence, owner deduplication and query building.

pub mod cancel;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use cancel::{CancelSignal, Cancelled};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::owner::{Owner, OwnerId, OwnerName};
pub use model::update::{
    FieldValue, FilterValue, UpdateSet, VehicleField, VehicleFilter, VehiclePatch, VehicleSearch,
};
pub use model::vehicle::{NewVehicle, Vehicle, VehicleId, VehicleValidationError};
pub use repo::shared::SharedVehicleRepository;
pub use repo::vehicle_repo::{
    ErrorKind, RepoError, RepoResult, SqliteVehicleRepository, VehicleRepository,
};
pub use service::vehicle_service::VehicleService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
