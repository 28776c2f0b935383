//! Normalization boundary for loosely-typed push payloads
//!
//! Order-created frames arrive from the push feed with field names that
//! vary by backend version: `id`/`orderId`/`order_id`, statuses in any
//! casing, assignee under `courier` or `assignee` spellings, timestamps as
//! epoch milliseconds or RFC 3339 strings. This module maps every known
//! variant onto the canonical [`Order`] shape and rejects payloads that
//! remain incomplete after mapping.
//!
//! Rejection is silent at the engine level — a malformed frame is expected
//! noise from the feed, counted and dropped, never a crash.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use types::ids::{CourierId, OrderId, TableId};
use types::order::Order;
use types::status::OrderStatus;

/// Why a payload could not be normalized into an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no order id after normalization")]
    MissingId,

    #[error("payload has no status after normalization")]
    MissingStatus,

    #[error("unrecognized status: {0:?}")]
    UnknownStatus(String),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// An id that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

impl RawId {
    fn as_i64(&self) -> Option<i64> {
        match self {
            RawId::Num(n) => Some(*n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A timestamp that may arrive as epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// The known field variants, collected before validation. Unrecognized
/// fields flatten into `details` and ride along untouched.
#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default, alias = "orderId", alias = "order_id")]
    id: Option<RawId>,

    #[serde(default, alias = "orderStatus", alias = "order_status")]
    status: Option<String>,

    #[serde(default, alias = "tableId", alias = "table_id")]
    table: Option<RawId>,

    #[serde(
        default,
        alias = "courierId",
        alias = "courier_id",
        alias = "assignee",
        alias = "assigneeId",
        alias = "assignee_id"
    )]
    courier: Option<RawId>,

    #[serde(default, alias = "createdAt", alias = "created_at")]
    created_at: Option<RawTimestamp>,

    #[serde(default, alias = "updatedAt", alias = "updated_at")]
    updated_at: Option<RawTimestamp>,

    #[serde(flatten)]
    details: serde_json::Map<String, serde_json::Value>,
}

/// Normalize a raw push payload into a canonical [`Order`].
///
/// `now` supplies the fallback for missing or unparseable timestamps (the
/// moment of ingestion); passing it in keeps this function deterministic.
pub fn normalize_order(
    payload: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<Order, NormalizeError> {
    if !payload.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let raw: RawFields = serde_json::from_value(payload)
        .map_err(|e| NormalizeError::Malformed(e.to_string()))?;

    // Id and status are the two fields the engine cannot live without.
    let id = raw
        .id
        .as_ref()
        .and_then(RawId::as_i64)
        .map(OrderId::new)
        .ok_or(NormalizeError::MissingId)?;

    let status_text = raw.status.ok_or(NormalizeError::MissingStatus)?;
    let status: OrderStatus = status_text
        .parse()
        .map_err(|_| NormalizeError::UnknownStatus(status_text))?;

    let created_at = raw
        .created_at
        .as_ref()
        .and_then(RawTimestamp::to_datetime)
        .unwrap_or(now);
    let updated_at = raw
        .updated_at
        .as_ref()
        .and_then(RawTimestamp::to_datetime)
        .unwrap_or(created_at);

    Ok(Order {
        id,
        status,
        table: raw.table.as_ref().and_then(RawId::as_i64).map(TableId::new),
        courier: raw
            .courier
            .as_ref()
            .and_then(RawId::as_i64)
            .map(CourierId::new),
        created_at,
        updated_at,
        details: serde_json::Value::Object(raw.details),
    })
}
