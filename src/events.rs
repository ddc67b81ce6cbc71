//! Device event lookups built on [`QueryBuilder`].
//!
//! Callers resolve which devices a user may see; this module only queries them.

use crate::backend::Backend;
use crate::query::QueryBuilder;
use crate::source::DataSource;
use crate::value::{Attributes, Timestamp};

/// Lowest event code stored in `device_events`.
pub const MIN_EVENT_CODE: i32 = 100;
/// Highest event code stored in `device_events`.
pub const MAX_EVENT_CODE: i32 = 101;

/// Events of one device and one code within `[from, to]`.
pub const SELECT_EVENTS: &str = "SELECT * FROM device_events \
    WHERE deviceId = :deviceId AND eventCode = :eventCode AND time BETWEEN :from AND :to \
    ORDER BY time";

pub const INSERT_EVENT: &str = "INSERT INTO device_events (deviceId, eventCode, time, attributes) \
    VALUES (:deviceId, :eventCode, :time, :attributes)";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceEvent {
    pub id: i64,
    pub device_id: i64,
    pub event_code: i32,
    pub time: Option<Timestamp>,
    pub attributes: Attributes,
}

crate::impl_describe!(DeviceEvent {
    id: i64,
    device_id as "deviceId": i64,
    event_code as "eventCode": i32,
    time: Option<Timestamp>,
    attributes: Attributes,
});

#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub device_ids: Vec<i64>,
    /// `0` selects every code from [`MIN_EVENT_CODE`] to [`MAX_EVENT_CODE`].
    pub event_code: i32,
    pub from: Timestamp,
    pub to: Timestamp,
}

impl EventFilter {
    fn codes(&self) -> Vec<i32> {
        if self.event_code == 0 {
            (MIN_EVENT_CODE..=MAX_EVENT_CODE).collect()
        } else {
            vec![self.event_code]
        }
    }
}

/// Loads the events matching `filter`, ordered by time.
///
/// Each (device, code) pair is its own query. A code outside the known range
/// matches nothing, so the result is empty rather than an error. Events without
/// a time come first.
///
/// # Errors
///
/// Returns the first error raised by any of the underlying queries.
pub async fn find_events<DB: Backend>(
    source: &DataSource<DB>,
    filter: &EventFilter,
) -> crate::Result<Vec<DeviceEvent>> {
    let codes = filter.codes();
    let mut events = Vec::new();
    for &device_id in &filter.device_ids {
        for &code in &codes {
            let found: Vec<DeviceEvent> = QueryBuilder::create(source, SELECT_EVENTS)
                .await?
                .set_long("deviceId", device_id)
                .set_integer("eventCode", code)
                .set_date("from", Some(filter.from))
                .set_date("to", Some(filter.to))
                .execute_query()
                .await?;
            events.extend(found);
        }
    }
    events.sort_by(|a, b| a.time.cmp(&b.time));
    tracing::debug!(
        devices = filter.device_ids.len(),
        codes = codes.len(),
        events = events.len(),
        "loaded device events"
    );
    Ok(events)
}

/// Stores `event` and returns its generated id. The `id` field is ignored.
///
/// # Errors
///
/// Returns an error if the insert fails or the attributes cannot be encoded
/// under [`FieldPolicy::Strict`](crate::FieldPolicy::Strict).
pub async fn insert_event<DB: Backend>(
    source: &DataSource<DB>,
    event: &DeviceEvent,
) -> crate::Result<i64> {
    QueryBuilder::create_with_keys(source, INSERT_EVENT, true)
        .await?
        .set_object(event)?
        .execute_update()
        .await
}
