//! Thread-safe store over one shared SQLite connection.
//!
//! # Invariants
//! - Operations take the connection lock for one round trip only.
//! - A poisoned lock is recovered; the connection carries no half-open
//!   transaction because every write commits or rolls back on drop.

use crate::cancel::CancelSignal;
use crate::model::owner::OwnerId;
use crate::model::update::{VehiclePatch, VehicleSearch};
use crate::model::vehicle::{NewVehicle, Vehicle, VehicleId};
use crate::repo::vehicle_repo::{RepoResult, SqliteVehicleRepository, VehicleRepository};
use log::warn;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// `Send + Sync` vehicle repository owning its connection.
pub struct SharedVehicleRepository {
    conn: Mutex<Connection>,
}

impl SharedVehicleRepository {
    /// Wraps a migrated connection (see `crate::db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_repo<T>(
        &self,
        op: impl FnOnce(&SqliteVehicleRepository<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let conn = acquire_lock(&self.conn);
        op(&SqliteVehicleRepository::new(&conn))
    }
}

fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("event=lock_recover module=repo status=warn lock=connection reason=poisoned");
        poisoned.into_inner()
    })
}

impl VehicleRepository for SharedVehicleRepository {
    fn insert_vehicle(
        &self,
        vehicle: &NewVehicle,
        signal: &CancelSignal,
    ) -> RepoResult<Vehicle> {
        self.with_repo(|repo| repo.insert_vehicle(vehicle, signal))
    }

    fn search_vehicles(
        &self,
        search: &VehicleSearch,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        self.with_repo(|repo| repo.search_vehicles(search, signal))
    }

    fn get_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<Option<Vehicle>> {
        self.with_repo(|repo| repo.get_vehicle(id, signal))
    }

    fn list_vehicles_by_owner(
        &self,
        owner_id: OwnerId,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        self.with_repo(|repo| repo.list_vehicles_by_owner(owner_id, signal))
    }

    fn update_vehicle(
        &self,
        id: VehicleId,
        patch: &VehiclePatch,
        signal: &CancelSignal,
    ) -> RepoResult<()> {
        self.with_repo(|repo| repo.update_vehicle(id, patch, signal))
    }

    fn delete_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<()> {
        self.with_repo(|repo| repo.delete_vehicle(id, signal))
    }
}
