//! Vehicle repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths validate input before any SQL runs.
//! - Every operation honors its `CancelSignal` and rolls back on interrupt.
//! - Read paths reject malformed persisted ids instead of masking them.

use crate::cancel::{CancelSignal, Cancelled};
use crate::db::DbError;
use crate::model::owner::{Owner, OwnerId, OwnerName};
use crate::model::update::{VehiclePatch, VehicleSearch};
use crate::model::vehicle::{NewVehicle, Vehicle, VehicleId, VehicleValidationError};
use crate::query::builder::{self, SqlQuery};
use rusqlite::{
    ffi, params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Caller-facing error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Persistence => "persistence",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Repository error for vehicle persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(VehicleValidationError),
    NotFound(VehicleId),
    /// Write would break owner name-pair uniqueness.
    Conflict(String),
    Cancelled,
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::Persistence,
        }
    }

    /// Message safe to hand to remote clients; no storage detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::NotFound(id) => format!("vehicle {id} not found"),
            Self::Conflict(_) => "owner with the same name already exists".to_string(),
            Self::Cancelled => "operation cancelled".to_string(),
            Self::Db(_) | Self::InvalidData(_) => "internal server error".to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "vehicle not found: {id}"),
            Self::Conflict(details) => write!(f, "conflict: {details}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted vehicle data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::Cancelled | Self::InvalidData(_) => None,
        }
    }
}

impl From<VehicleValidationError> for RepoError {
    fn from(value: VehicleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<Cancelled> for RepoError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
                return Self::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "unique constraint failed".to_string()),
                );
            }
        }
        if value.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            return Self::Cancelled;
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store contract over vehicles and their deduplicated owners.
pub trait VehicleRepository {
    /// Resolves or creates the owner, then creates the vehicle.
    fn insert_vehicle(&self, vehicle: &NewVehicle, signal: &CancelSignal)
        -> RepoResult<Vehicle>;
    /// Filtered, paginated search. Empty when nothing matches.
    fn search_vehicles(
        &self,
        search: &VehicleSearch,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>>;
    fn get_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<Option<Vehicle>>;
    fn list_vehicles_by_owner(
        &self,
        owner_id: OwnerId,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>>;
    /// Applies a sparse update; `NotFound` when the vehicle does not exist.
    fn update_vehicle(
        &self,
        id: VehicleId,
        patch: &VehiclePatch,
        signal: &CancelSignal,
    ) -> RepoResult<()>;
    /// Hard-deletes the vehicle; its owner is kept.
    fn delete_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<()>;
}

/// SQLite-backed vehicle repository over a borrowed, migrated connection.
pub struct SqliteVehicleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVehicleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn begin_write(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn query_vehicles(&self, query: &SqlQuery) -> RepoResult<Vec<Vehicle>> {
        let mut stmt = self.conn.prepare(&query.sql)?;
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;
        let mut vehicles = Vec::new();
        while let Some(row) = rows.next()? {
            vehicles.push(parse_vehicle_row(row)?);
        }
        Ok(vehicles)
    }
}

impl VehicleRepository for SqliteVehicleRepository<'_> {
    fn insert_vehicle(
        &self,
        vehicle: &NewVehicle,
        signal: &CancelSignal,
    ) -> RepoResult<Vehicle> {
        let vehicle = &vehicle.normalized();
        vehicle.validate()?;
        signal.check()?;
        let tx = self.begin_write()?;
        // Declared after `tx` so the handler is gone before rollback-on-drop.
        let _interrupt = signal.attach(self.conn);
        let owner_id = find_or_create_owner(&tx, &vehicle.owner)?;
        let vehicle_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO vehicles (
                id,
                registration_number,
                make,
                model,
                year,
                owner_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                vehicle_id.to_string(),
                vehicle.registration_number.as_str(),
                vehicle.make.as_str(),
                vehicle.model.as_str(),
                vehicle.year,
                owner_id.to_string(),
            ],
        )?;
        signal.check()?;
        tx.commit()?;

        Ok(Vehicle {
            id: vehicle_id,
            registration_number: vehicle.registration_number.clone(),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            owner: Owner {
                id: owner_id,
                given_name: vehicle.owner.given_name.clone(),
                family_name: vehicle.owner.family_name.clone(),
            },
        })
    }

    fn search_vehicles(
        &self,
        search: &VehicleSearch,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        signal.check()?;
        let _interrupt = signal.attach(self.conn);
        self.query_vehicles(&builder::search(search))
    }

    fn get_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<Option<Vehicle>> {
        signal.check()?;
        let _interrupt = signal.attach(self.conn);
        Ok(self.query_vehicles(&builder::by_id(id))?.into_iter().next())
    }

    fn list_vehicles_by_owner(
        &self,
        owner_id: OwnerId,
        signal: &CancelSignal,
    ) -> RepoResult<Vec<Vehicle>> {
        signal.check()?;
        let _interrupt = signal.attach(self.conn);
        self.query_vehicles(&builder::by_owner(owner_id))
    }

    fn update_vehicle(
        &self,
        id: VehicleId,
        patch: &VehiclePatch,
        signal: &CancelSignal,
    ) -> RepoResult<()> {
        let patch = &patch.normalized();
        patch.validate()?;
        signal.check()?;
        let tx = self.begin_write()?;
        let _interrupt = signal.attach(self.conn);
        let owner_id = current_owner_id(&tx, id)?.ok_or(RepoError::NotFound(id))?;

        let plan = builder::update(id, owner_id, &patch.update_set());
        if let Some(statement) = plan.vehicle.as_ref() {
            let changed = tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
        }
        if let Some(statement) = plan.owner.as_ref() {
            let changed = tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
            if changed == 0 {
                return Err(RepoError::InvalidData(format!(
                    "vehicle {id} references missing owner {owner_id}"
                )));
            }
        }

        signal.check()?;
        tx.commit()?;
        Ok(())
    }

    fn delete_vehicle(&self, id: VehicleId, signal: &CancelSignal) -> RepoResult<()> {
        signal.check()?;
        let _interrupt = signal.attach(self.conn);

        let changed = self
            .conn
            .execute("DELETE FROM vehicles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Returns the id of the owner with this name pair, creating it if absent.
///
/// Relies on `UNIQUE (given_name, family_name)`: concurrent callers racing
/// on the same pair converge on one row.
fn find_or_create_owner(tx: &Transaction<'_>, owner: &OwnerName) -> RepoResult<OwnerId> {
    tx.execute(
        "INSERT INTO owners (id, given_name, family_name)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (given_name, family_name) DO NOTHING;",
        params![
            Uuid::new_v4().to_string(),
            owner.given_name.as_str(),
            owner.family_name.as_str(),
        ],
    )?;

    let id_text: String = tx.query_row(
        "SELECT id FROM owners WHERE given_name = ?1 AND family_name = ?2;",
        params![owner.given_name.as_str(), owner.family_name.as_str()],
        |row| row.get(0),
    )?;
    parse_id(&id_text, "owners.id")
}

fn current_owner_id(tx: &Transaction<'_>, id: VehicleId) -> RepoResult<Option<OwnerId>> {
    let owner_text: Option<String> = tx
        .query_row(
            "SELECT owner_id FROM vehicles WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    owner_text
        .map(|value| parse_id(&value, "vehicles.owner_id"))
        .transpose()
}

fn parse_vehicle_row(row: &Row<'_>) -> RepoResult<Vehicle> {
    let vehicle_id: String = row.get("vehicle_id")?;
    let owner_id: String = row.get("owner_id")?;

    Ok(Vehicle {
        id: parse_id(&vehicle_id, "vehicles.id")?,
        registration_number: row.get("registration_number")?,
        make: row.get("make")?,
        model: row.get("model")?,
        year: row.get("year")?,
        owner: Owner {
            id: parse_id(&owner_id, "owners.id")?,
            given_name: row.get("given_name")?,
            family_name: row.get("family_name")?,
        },
    })
}

fn parse_id(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
