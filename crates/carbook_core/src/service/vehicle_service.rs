//! Vehicle use-case service.
//!
//! # Responsibility
//! - Provide the public insert/search/get/update/delete entry points.
//! - Turn transport-shaped search parameters into typed filters.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - `get_by_id` reports a missing vehicle as `RepoError::NotFound`.
//! - Empty search results are success, never an error.
//! - Log events never contain names or registration numbers.

use crate::cancel::CancelSignal;
use crate::model::owner::OwnerId;
use crate::model::update::{VehicleFilter, VehiclePatch, VehicleSearch};
use crate::model::vehicle::{NewVehicle, Vehicle, VehicleId};
use crate::repo::vehicle_repo::{ErrorKind, RepoError, RepoResult, VehicleRepository};
use log::{debug, info, warn};
use std::time::Instant;

/// Use-case facade over a vehicle repository.
pub struct VehicleService<R: VehicleRepository> {
    repo: R,
}

impl<R: VehicleRepository> VehicleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a vehicle, reusing an existing owner with the same name pair.
    pub fn insert(&self, vehicle: &NewVehicle, signal: &CancelSignal) -> RepoResult<Vehicle> {
        let started_at = Instant::now();
        let result = self.repo.insert_vehicle(vehicle, signal);
        log_outcome("vehicle_insert", started_at, &result);
        result
    }

    /// Lists vehicles matching `search`; empty when nothing matches.
    pub fn search(
        &self,
        search: &VehicleSearch,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        let started_at = Instant::now();
        let result = self.repo.search_vehicles(search, signal);
        if let Ok(vehicles) = result.as_ref() {
            debug!(
                "event=vehicle_search module=service filtered={} limit={} offset={} rows={}",
                search.filter.is_some(),
                search.limit,
                search.offset,
                vehicles.len()
            );
        }
        log_outcome("vehicle_search", started_at, &result);
        result
    }

    /// Search from raw `filter`/`search`/`limit`/`offset` parameters.
    ///
    /// An unknown filter name or a value of the wrong shape is a
    /// validation error; a missing filter or empty search is a full scan.
    pub fn search_by(
        &self,
        filter: Option<&str>,
        search: Option<&str>,
        limit: u32,
        offset: u32,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        let filter = VehicleFilter::parse(filter, search)?;
        self.search(
            &VehicleSearch {
                filter,
                limit,
                offset,
            },
            signal,
        )
    }

    /// Gets one vehicle.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no vehicle has this id.
    pub fn get_by_id(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<Vehicle> {
        let started_at = Instant::now();
        let result = self
            .repo
            .get_vehicle(id, signal)
            .and_then(|found| found.ok_or(RepoError::NotFound(id)));
        log_outcome("vehicle_get", started_at, &result);
        result
    }

    /// Lists all vehicles of one owner; empty for unknown owners.
    pub fn get_by_owner(
        &self,
        owner_id: OwnerId,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        let started_at = Instant::now();
        let result = self.repo.list_vehicles_by_owner(owner_id, signal);
        log_outcome("vehicle_list_by_owner", started_at, &result);
        result
    }

    /// Applies a sparse update atomically.
    ///
    /// An empty patch only checks that the vehicle exists.
    pub fn update(
        &self,
        id: VehicleId,
        patch: &VehiclePatch,
        signal: &CancelSignal,
    ) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.update_vehicle(id, patch, signal);
        log_outcome("vehicle_update", started_at, &result);
        result
    }

    /// Deletes one vehicle; its owner and sibling vehicles are untouched.
    pub fn delete(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo.delete_vehicle(id, signal);
        log_outcome("vehicle_delete", started_at, &result);
        result
    }
}

fn log_outcome<T>(event: &str, started_at: Instant, result: &RepoResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) if err.kind() == ErrorKind::Persistence => warn!(
            "event={event} module=service status=error duration_ms={duration_ms} error_kind=persistence error={err}"
        ),
        Err(err) => info!(
            "event={event} module=service status=error duration_ms={duration_ms} error_kind={}",
            err.kind().as_str()
        ),
    }
}
