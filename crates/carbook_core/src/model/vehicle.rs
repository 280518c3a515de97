//! Vehicle domain model.
//!
//! # Responsibility
//! - Define the insert payload (`NewVehicle`) and read model (`Vehicle`).
//! - Validate caller input before it reaches storage.
//!
//! # Invariants
//! - `registration_number` is non-blank and limited to ASCII letters,
//!   digits, spaces and dashes.
//! - A vehicle read model always embeds its owner's current attributes.

use crate::model::owner::{Owner, OwnerName};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static REGISTRATION_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]*$").expect("valid registration number regex")
});

/// Stable identifier of a vehicle row.
pub type VehicleId = Uuid;

/// Input validation failures detected before any storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleValidationError {
    EmptyRegistrationNumber,
    InvalidRegistrationNumber(String),
    EmptyOwnerGivenName,
    EmptyOwnerFamilyName,
    UnknownField(String),
    InvalidFilterValue {
        field: &'static str,
        value: String,
    },
}

impl Display for VehicleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRegistrationNumber => write!(f, "registration number cannot be empty"),
            Self::InvalidRegistrationNumber(value) => {
                write!(f, "invalid registration number `{value}`")
            }
            Self::EmptyOwnerGivenName => write!(f, "owner given name cannot be empty"),
            Self::EmptyOwnerFamilyName => write!(f, "owner family name cannot be empty"),
            Self::UnknownField(name) => write!(f, "unknown vehicle field `{name}`"),
            Self::InvalidFilterValue { field, value } => {
                write!(f, "invalid value `{value}` for filter field `{field}`")
            }
        }
    }
}

impl Error for VehicleValidationError {}

/// Insert payload: a vehicle plus the name pair of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicle {
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub owner: OwnerName,
}

impl NewVehicle {
    pub fn new(
        registration_number: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        owner: OwnerName,
    ) -> Self {
        Self {
            registration_number: registration_number.into(),
            make: make.into(),
            model: model.into(),
            year,
            owner,
        }
    }

    /// Copy with the registration number and owner names trimmed.
    ///
    /// Make and model are stored as given.
    pub fn normalized(&self) -> Self {
        Self {
            registration_number: self.registration_number.trim().to_string(),
            owner: self.owner.trimmed(),
            ..self.clone()
        }
    }

    /// Validates the payload.
    ///
    /// # Errors
    /// - Blank or malformed registration number.
    /// - Blank owner given or family name.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        validate_registration_number(&self.registration_number)?;
        self.owner.validate()
    }
}

/// Vehicle read model joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub registration_number: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub owner: Owner,
}

pub(crate) fn validate_registration_number(value: &str) -> Result<(), VehicleValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VehicleValidationError::EmptyRegistrationNumber);
    }
    if !REGISTRATION_NUMBER_RE.is_match(trimmed) {
        return Err(VehicleValidationError::InvalidRegistrationNumber(
            value.to_string(),
        ));
    }
    Ok(())
}
