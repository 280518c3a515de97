use carbook_core::db::open_db_in_memory;
use carbook_core::{
    CancelSignal, ErrorKind, NewVehicle, OwnerName, RepoError, SqliteVehicleRepository,
    VehiclePatch, VehicleRepository, VehicleSearch,
};
use rusqlite::Connection;
use std::time::Duration;

fn sample(reg: &str) -> NewVehicle {
    NewVehicle::new(reg, "Kia", "Rio", 2012, OwnerName::new("Ann", "Lee"))
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn cancelled_insert_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::new(&conn);
    let signal = CancelSignal::new();
    signal.cancel();

    let err = repo.insert_vehicle(&sample("AA1"), &signal).unwrap_err();
    assert!(matches!(err, RepoError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(count(&conn, "owners"), 0);
    assert_eq!(count(&conn, "vehicles"), 0);
}

/// Installs a trigger on `table` whose body scans a cross join large enough
/// to outlast any deadline used below, so the statement is interrupted
/// after earlier writes of the same transaction have run.
fn stall_after_write_to(conn: &Connection, table: &str, event: &str) {
    conn.execute_batch(&format!(
        "CREATE TABLE ballast (x INTEGER NOT NULL);
         WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 1000)
         INSERT INTO ballast (x) SELECT x FROM n;
         CREATE TRIGGER stall_after_write AFTER {event} ON {table}
         BEGIN
             SELECT COUNT(*) FROM ballast a, ballast b, ballast c;
         END;"
    ))
    .unwrap();
}

#[test]
fn deadline_during_insert_rolls_back_owner_and_vehicle() {
    let conn = open_db_in_memory().unwrap();
    stall_after_write_to(&conn, "vehicles", "INSERT");
    let repo = SqliteVehicleRepository::new(&conn);

    let signal = CancelSignal::with_timeout(Duration::from_millis(100));
    let err = repo.insert_vehicle(&sample("AA1"), &signal).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(conn.is_autocommit());
    assert_eq!(count(&conn, "owners"), 0);
    assert_eq!(count(&conn, "vehicles"), 0);
}

#[test]
fn deadline_during_owner_rename_keeps_vehicle_and_owner_intact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::new(&conn);
    let created = repo
        .insert_vehicle(&sample("AA1"), &CancelSignal::new())
        .unwrap();
    stall_after_write_to(&conn, "owners", "UPDATE");

    let patch = VehiclePatch {
        make: Some("Volvo".to_string()),
        owner: Some(OwnerName::new("Kim", "Park")),
        ..VehiclePatch::default()
    };
    let signal = CancelSignal::with_timeout(Duration::from_millis(100));
    let err = repo
        .update_vehicle(created.id, &patch, &signal)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(conn.is_autocommit());
    let unchanged = repo
        .get_vehicle(created.id, &CancelSignal::new())
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, created);
    assert_eq!(unchanged.owner.name(), OwnerName::new("Ann", "Lee"));
}

#[test]
fn expired_deadline_fails_fast_for_every_operation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::new(&conn);
    let created = repo
        .insert_vehicle(&sample("AA1"), &CancelSignal::new())
        .unwrap();
    let expired = CancelSignal::with_timeout(Duration::ZERO);

    let patch = VehiclePatch {
        make: Some("Volvo".to_string()),
        ..VehiclePatch::default()
    };
    let results = [
        repo.search_vehicles(&VehicleSearch::default(), &expired)
            .map(|_| ()),
        repo.get_vehicle(created.id, &expired).map(|_| ()),
        repo.list_vehicles_by_owner(created.owner.id, &expired)
            .map(|_| ()),
        repo.update_vehicle(created.id, &patch, &expired),
        repo.delete_vehicle(created.id, &expired),
    ];
    for result in results {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    }

    let unchanged = repo
        .get_vehicle(created.id, &CancelSignal::new())
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, created);
}

#[test]
fn handler_is_removed_after_operation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVehicleRepository::new(&conn);
    let signal = CancelSignal::new();

    repo.insert_vehicle(&sample("AA1"), &signal).unwrap();
    signal.cancel();

    let rows: i64 = conn
        .query_row(
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 100000)
             SELECT COUNT(*) FROM n;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 100000);
}
