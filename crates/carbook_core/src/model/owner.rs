//! Owner domain model.
//!
//! # Invariants
//! - `id` is generated once and never reused.
//! - `(given_name, family_name)` is unique across stored owners.

use crate::model::vehicle::VehicleValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an owner row.
pub type OwnerId = Uuid;

/// Name pair used to resolve (or create) an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerName {
    pub given_name: String,
    pub family_name: String,
}

impl OwnerName {
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
        }
    }

    /// Copy with surrounding whitespace removed; this is the stored and
    /// deduplicated form, so `"John "` and `"John"` resolve to one owner.
    pub fn trimmed(&self) -> Self {
        Self::new(self.given_name.trim(), self.family_name.trim())
    }

    /// Rejects name pairs with a blank component.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        if self.given_name.trim().is_empty() {
            return Err(VehicleValidationError::EmptyOwnerGivenName);
        }
        if self.family_name.trim().is_empty() {
            return Err(VehicleValidationError::EmptyOwnerFamilyName);
        }
        Ok(())
    }
}

/// Persisted owner as embedded in vehicle read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub given_name: String,
    pub family_name: String,
}

impl Owner {
    /// Returns the deduplication key of this owner.
    pub fn name(&self) -> OwnerName {
        OwnerName::new(self.given_name.clone(), self.family_name.clone())
    }
}
