//! Closed field set, filters and sparse update sets.
//!
//! # Responsibility
//! - Name the vehicle columns that may appear in query text.
//! - Turn explicit optional-field patches into ordered update sets.
//!
//! # Invariants
//! - `VehicleField::Id` is a lookup-only field and never lands in an
//!   `UpdateSet`; update sets can only be built from a `VehiclePatch`.
//! - `None` patch fields mean "unchanged"; `Some("")` means "set empty".

use crate::model::owner::{OwnerId, OwnerName};
use crate::model::vehicle::{validate_registration_number, VehicleValidationError};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Vehicle fields eligible for filtering and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleField {
    /// Vehicle identity. Lookup only.
    Id,
    RegistrationNumber,
    Make,
    Model,
    Year,
    /// Owner reference. Filters match the owner id; updates rename the owner.
    Owner,
}

impl VehicleField {
    pub const ALL: [VehicleField; 6] = [
        Self::Id,
        Self::RegistrationNumber,
        Self::Make,
        Self::Model,
        Self::Year,
        Self::Owner,
    ];

    /// External name used by transports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::RegistrationNumber => "registration_number",
            Self::Make => "make",
            Self::Model => "model",
            Self::Year => "year",
            Self::Owner => "owner",
        }
    }
}

impl Display for VehicleField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleField {
    type Err = VehicleValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| VehicleValidationError::UnknownField(value.to_string()))
    }
}

/// Typed filter operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

/// Single equality predicate on a vehicle field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleFilter {
    pub field: VehicleField,
    pub value: FilterValue,
}

impl VehicleFilter {
    /// Builds a filter, coercing `value` to the field's storage type.
    ///
    /// # Errors
    /// - `year` values that are not integers.
    /// - `id`/`owner` values that are not UUIDs.
    pub fn new(field: VehicleField, value: &str) -> Result<Self, VehicleValidationError> {
        let invalid = || VehicleValidationError::InvalidFilterValue {
            field: field.as_str(),
            value: value.to_string(),
        };
        let value = match field {
            VehicleField::Year => {
                FilterValue::Integer(value.trim().parse::<i64>().map_err(|_| invalid())?)
            }
            VehicleField::Id | VehicleField::Owner => {
                let id = Uuid::parse_str(value.trim()).map_err(|_| invalid())?;
                FilterValue::Text(id.to_string())
            }
            VehicleField::RegistrationNumber => FilterValue::Text(value.trim().to_string()),
            VehicleField::Make | VehicleField::Model => FilterValue::Text(value.to_string()),
        };
        Ok(Self { field, value })
    }

    /// Parses transport-shaped filter parameters.
    ///
    /// Returns `Ok(None)` unless both a field name and a non-empty search
    /// value are supplied.
    pub fn parse(
        field: Option<&str>,
        search: Option<&str>,
    ) -> Result<Option<Self>, VehicleValidationError> {
        match (field, search) {
            (Some(field), Some(search)) if !field.trim().is_empty() && !search.is_empty() => {
                Self::new(field.parse()?, search).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn owner(owner_id: OwnerId) -> Self {
        Self {
            field: VehicleField::Owner,
            value: FilterValue::Text(owner_id.to_string()),
        }
    }
}

/// Search options: optional filter plus pagination.
///
/// `limit == 0` means unlimited; `offset == 0` means no offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleSearch {
    pub filter: Option<VehicleFilter>,
    pub limit: u32,
    pub offset: u32,
}

/// Sparse vehicle update with explicit presence markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehiclePatch {
    pub registration_number: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub owner: Option<OwnerName>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.registration_number.is_none()
            && self.make.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.owner.is_none()
    }

    /// Copy with a present registration number and owner names trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            registration_number: self
                .registration_number
                .as_deref()
                .map(|value| value.trim().to_string()),
            owner: self.owner.as_ref().map(OwnerName::trimmed),
            ..self.clone()
        }
    }

    /// Validates present fields only.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        if let Some(value) = self.registration_number.as_deref() {
            validate_registration_number(value)?;
        }
        if let Some(owner) = self.owner.as_ref() {
            owner.validate()?;
        }
        Ok(())
    }

    /// Projects present fields into an ordered update set.
    pub fn update_set(&self) -> UpdateSet {
        let mut values = BTreeMap::new();
        if let Some(value) = self.registration_number.as_ref() {
            values.insert(
                VehicleField::RegistrationNumber,
                FieldValue::Text(value.clone()),
            );
        }
        if let Some(value) = self.make.as_ref() {
            values.insert(VehicleField::Make, FieldValue::Text(value.clone()));
        }
        if let Some(value) = self.model.as_ref() {
            values.insert(VehicleField::Model, FieldValue::Text(value.clone()));
        }
        if let Some(value) = self.year {
            values.insert(VehicleField::Year, FieldValue::Year(value));
        }
        if let Some(owner) = self.owner.as_ref() {
            values.insert(VehicleField::Owner, FieldValue::Owner(owner.clone()));
        }
        UpdateSet { values }
    }
}

/// New value for one updatable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Year(i32),
    Owner(OwnerName),
}

/// Ordered field -> value mapping derived from a `VehiclePatch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSet {
    values: BTreeMap<VehicleField, FieldValue>,
}

impl UpdateSet {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, field: VehicleField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    /// Owner rename carried by this set, if any.
    pub fn owner(&self) -> Option<&OwnerName> {
        match self.values.get(&VehicleField::Owner) {
            Some(FieldValue::Owner(name)) => Some(name),
            _ => None,
        }
    }

    /// Entries that target `vehicles` columns, in field order.
    pub fn vehicle_columns(&self) -> impl Iterator<Item = (VehicleField, &FieldValue)> + '_ {
        self.iter().filter(|(field, _)| *field != VehicleField::Owner)
    }

    pub fn iter(&self) -> UpdateSetIter<'_> {
        UpdateSetIter {
            inner: self.values.iter(),
        }
    }
}

pub struct UpdateSetIter<'a> {
    inner: btree_map::Iter<'a, VehicleField, FieldValue>,
}

impl<'a> Iterator for UpdateSetIter<'a> {
    type Item = (VehicleField, &'a FieldValue);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(field, value)| (*field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, FilterValue, VehicleField, VehicleFilter, VehiclePatch};
    use crate::model::owner::OwnerName;
    use crate::model::vehicle::VehicleValidationError;

    #[test]
    fn empty_patch_yields_empty_set() {
        let patch = VehiclePatch::default();
        assert!(patch.is_empty());
        assert!(patch.update_set().is_empty());
    }

    #[test]
    fn explicit_empty_string_is_kept() {
        let patch = VehiclePatch {
            make: Some(String::new()),
            ..VehiclePatch::default()
        };
        let set = patch.update_set();
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(VehicleField::Make),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn update_set_orders_fields_and_separates_owner() {
        let patch = VehiclePatch {
            year: Some(2015),
            make: Some("Kia".to_string()),
            owner: Some(OwnerName::new("Ann", "Lee")),
            ..VehiclePatch::default()
        };
        let set = patch.update_set();
        let fields: Vec<_> = set.iter().map(|(field, _)| field).collect();
        assert_eq!(
            fields,
            vec![VehicleField::Make, VehicleField::Year, VehicleField::Owner]
        );
        let columns: Vec<_> = set.vehicle_columns().map(|(field, _)| field).collect();
        assert_eq!(columns, vec![VehicleField::Make, VehicleField::Year]);
        assert_eq!(set.owner(), Some(&OwnerName::new("Ann", "Lee")));
        assert!(set.get(VehicleField::Id).is_none());
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!("MAKE".parse::<VehicleField>().unwrap(), VehicleField::Make);
        assert_eq!(
            " registration_number ".parse::<VehicleField>().unwrap(),
            VehicleField::RegistrationNumber
        );
        let err = "make; DROP TABLE vehicles".parse::<VehicleField>().unwrap_err();
        assert!(matches!(err, VehicleValidationError::UnknownField(_)));
    }

    #[test]
    fn filter_values_are_coerced_per_field() {
        let year = VehicleFilter::new(VehicleField::Year, "2010").unwrap();
        assert_eq!(year.value, FilterValue::Integer(2010));

        let err = VehicleFilter::new(VehicleField::Year, "twenty").unwrap_err();
        assert!(matches!(
            err,
            VehicleValidationError::InvalidFilterValue { field: "year", .. }
        ));

        assert!(VehicleFilter::new(VehicleField::Owner, "not-a-uuid").is_err());

        let registration = VehicleFilter::new(VehicleField::RegistrationNumber, " AA2 ").unwrap();
        assert_eq!(registration.value, FilterValue::Text("AA2".to_string()));
    }

    #[test]
    fn parse_requires_field_and_non_empty_search() {
        assert_eq!(VehicleFilter::parse(None, Some("Kia")).unwrap(), None);
        assert_eq!(VehicleFilter::parse(Some("make"), Some("")).unwrap(), None);
        assert_eq!(VehicleFilter::parse(Some(""), Some("Kia")).unwrap(), None);
        let filter = VehicleFilter::parse(Some("make"), Some("Kia"))
            .unwrap()
            .unwrap();
        assert_eq!(filter.field, VehicleField::Make);
        assert!(VehicleFilter::parse(Some("colour"), Some("red")).is_err());
    }

    #[test]
    fn patch_deserializes_missing_fields_as_absent() {
        let patch: VehiclePatch = serde_json::from_str(r#"{"model": ""}"#).unwrap();
        assert_eq!(patch.model.as_deref(), Some(""));
        assert!(patch.make.is_none());
        assert!(patch.owner.is_none());
    }

    #[test]
    fn patch_normalization_keeps_absent_fields_absent() {
        let patch = VehiclePatch {
            registration_number: Some(" BB7 ".to_string()),
            make: Some(" ".to_string()),
            owner: Some(OwnerName::new(" Ann", "Lee ")),
            ..VehiclePatch::default()
        }
        .normalized();
        assert_eq!(patch.registration_number.as_deref(), Some("BB7"));
        assert_eq!(patch.make.as_deref(), Some(" "));
        assert_eq!(patch.owner, Some(OwnerName::new("Ann", "Lee")));
        assert!(patch.model.is_none());
        assert!(VehiclePatch::default().normalized().is_empty());
    }

    #[test]
    fn patch_validation_checks_present_fields() {
        let patch = VehiclePatch {
            owner: Some(OwnerName::new("", "Lee")),
            ..VehiclePatch::default()
        };
        assert_eq!(
            patch.validate(),
            Err(VehicleValidationError::EmptyOwnerGivenName)
        );
    }
}
