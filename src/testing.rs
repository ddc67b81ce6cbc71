//! Shared fixtures for the database-backed unit tests.

use crate::value::{Attributes, Timestamp};
use crate::DataSource;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Sqlite;
use std::time::Duration;

const DEVICE_TABLE: &str = "CREATE TABLE device (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT '',
    uniqueid TEXT,
    disabled BOOLEAN NOT NULL DEFAULT 0,
    speedlimit REAL NOT NULL DEFAULT 0,
    groupid INTEGER NOT NULL DEFAULT 0,
    lastupdate DATETIME,
    attributes TEXT
)";

const EVENT_TABLE: &str = "CREATE TABLE device_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deviceid INTEGER NOT NULL,
    eventcode INTEGER NOT NULL,
    time DATETIME,
    attributes TEXT
)";

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Device {
    pub id: i64,
    pub name: String,
    pub unique_id: Option<String>,
    pub disabled: bool,
    pub speed_limit: f64,
    pub group_id: i32,
    pub last_update: Option<Timestamp>,
    pub attributes: Attributes,
}

crate::impl_describe!(Device {
    id: i64,
    name: String,
    unique_id as "uniqueId": Option<String>,
    disabled: bool,
    speed_limit as "speedLimit": f64,
    group_id as "groupId": i32,
    last_update as "lastUpdate": Option<Timestamp>,
    attributes: Attributes,
});

/// An in-memory database with the device and event tables.
///
/// The pool holds a single connection, so a builder that fails to release its
/// connection makes the next acquire time out.
pub(crate) async fn memory_source() -> DataSource<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(2))
        .connect("sqlite::memory:")
        .await
        .unwrap();
    for table in [DEVICE_TABLE, EVENT_TABLE] {
        sqlx::query(table).execute(&pool).await.unwrap();
    }
    DataSource::new(pool)
}
