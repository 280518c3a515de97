//! Statement builders over the `vehicles`/`owners` schema.

use crate::model::owner::OwnerId;
use crate::model::update::{FieldValue, FilterValue, UpdateSet, VehicleField, VehicleSearch};
use crate::model::vehicle::VehicleId;
use rusqlite::types::Value;

/// Shared projection; column aliases are read back by `repo` row parsing.
pub const VEHICLE_SELECT_SQL: &str = "SELECT
    v.id AS vehicle_id,
    v.registration_number,
    v.make,
    v.model,
    v.year,
    o.id AS owner_id,
    o.given_name,
    o.family_name
FROM vehicles v
INNER JOIN owners o ON o.id = v.owner_id";

/// SQL text plus positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) {
        self.params.push(value);
    }
}

/// Statements for one sparse update; either may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    pub vehicle: Option<SqlQuery>,
    pub owner: Option<SqlQuery>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.vehicle.is_none() && self.owner.is_none()
    }
}

/// Qualified column for a field in the joined projection.
fn select_column(field: VehicleField) -> &'static str {
    match field {
        VehicleField::Id => "v.id",
        VehicleField::RegistrationNumber => "v.registration_number",
        VehicleField::Make => "v.make",
        VehicleField::Model => "v.model",
        VehicleField::Year => "v.year",
        VehicleField::Owner => "v.owner_id",
    }
}

/// Unqualified `vehicles` column targeted by an assignment.
fn assign_column(field: VehicleField) -> Option<&'static str> {
    match field {
        VehicleField::RegistrationNumber => Some("registration_number"),
        VehicleField::Make => Some("make"),
        VehicleField::Model => Some("model"),
        VehicleField::Year => Some("year"),
        VehicleField::Id | VehicleField::Owner => None,
    }
}

/// Filtered, paginated search over vehicles joined with owners.
///
/// Ordered by vehicle id so that limit/offset windows are stable.
pub fn search(search: &VehicleSearch) -> SqlQuery {
    let mut query = SqlQuery::new(VEHICLE_SELECT_SQL);

    if let Some(filter) = search.filter.as_ref() {
        query.sql.push_str(" WHERE ");
        query.sql.push_str(select_column(filter.field));
        query.sql.push_str(" = ?");
        query.bind(match &filter.value {
            FilterValue::Text(value) => Value::Text(value.clone()),
            FilterValue::Integer(value) => Value::Integer(*value),
        });
    }

    query.sql.push_str(" ORDER BY v.id ASC");

    if search.limit > 0 {
        query.sql.push_str(" LIMIT ?");
        query.bind(Value::Integer(i64::from(search.limit)));
        if search.offset > 0 {
            query.sql.push_str(" OFFSET ?");
            query.bind(Value::Integer(i64::from(search.offset)));
        }
    } else if search.offset > 0 {
        query.sql.push_str(" LIMIT -1 OFFSET ?");
        query.bind(Value::Integer(i64::from(search.offset)));
    }

    query
}

/// Single vehicle by id.
pub fn by_id(id: VehicleId) -> SqlQuery {
    let mut query = SqlQuery::new(format!("{VEHICLE_SELECT_SQL} WHERE v.id = ?"));
    query.bind(Value::Text(id.to_string()));
    query
}

/// All vehicles of one owner.
pub fn by_owner(owner_id: OwnerId) -> SqlQuery {
    let mut query = SqlQuery::new(format!(
        "{VEHICLE_SELECT_SQL} WHERE o.id = ? ORDER BY v.id ASC"
    ));
    query.bind(Value::Text(owner_id.to_string()));
    query
}

/// Builds the vehicle and owner statements for a sparse update.
///
/// `owner_id` must be the owner currently referenced by `vehicle_id`.
pub fn update(vehicle_id: VehicleId, owner_id: OwnerId, set: &UpdateSet) -> UpdatePlan {
    let mut vehicle = SqlQuery::new("UPDATE vehicles SET ");
    let mut assignments = 0usize;
    for (field, value) in set.vehicle_columns() {
        let (Some(column), Some(bound)) = (assign_column(field), field_value(value)) else {
            continue;
        };
        if assignments > 0 {
            vehicle.sql.push_str(", ");
        }
        vehicle.sql.push_str(column);
        vehicle.sql.push_str(" = ?");
        vehicle.bind(bound);
        assignments += 1;
    }
    vehicle.sql.push_str(" WHERE id = ?");
    vehicle.bind(Value::Text(vehicle_id.to_string()));

    let owner = set.owner().map(|name| {
        let mut owner =
            SqlQuery::new("UPDATE owners SET given_name = ?, family_name = ? WHERE id = ?");
        owner.bind(Value::Text(name.given_name.clone()));
        owner.bind(Value::Text(name.family_name.clone()));
        owner.bind(Value::Text(owner_id.to_string()));
        owner
    });

    UpdatePlan {
        vehicle: (assignments > 0).then_some(vehicle),
        owner,
    }
}

fn field_value(value: &FieldValue) -> Option<Value> {
    match value {
        FieldValue::Text(text) => Some(Value::Text(text.clone())),
        FieldValue::Year(year) => Some(Value::Integer(i64::from(*year))),
        FieldValue::Owner(_) => None,
    }
}
