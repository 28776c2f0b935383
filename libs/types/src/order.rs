//! The canonical order shape
//!
//! Orders are owned by the backend; this crate models the fields the
//! reconciliation engine needs for membership decisions (id, status, table,
//! courier) plus timestamps for age display. Everything else — items,
//! totals, customer info, payment/receipt metadata — rides along as an
//! opaque JSON payload the engine never interprets.

use crate::ids::{CourierId, OrderId, TableId};
use crate::status::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A restaurant order as the reconciliation engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Backend-assigned id, unique and immutable.
    pub id: OrderId,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Dining table reference. Present on salon (dine-in) orders.
    pub table: Option<TableId>,
    /// Assigned delivery courier, if any.
    pub courier: Option<CourierId>,
    /// Creation time, immutable; used for age/urgency display.
    pub created_at: DateTime<Utc>,
    /// Last backend-reported update time.
    pub updated_at: DateTime<Utc>,
    /// Opaque payload: items, totals, customer info, payment/receipt
    /// metadata. The engine carries it but never inspects it.
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Order {
    /// Create an order with an empty payload. Mostly useful for tests and
    /// data-source adapters that fill `details` separately.
    pub fn new(
        id: OrderId,
        status: OrderStatus,
        table: Option<TableId>,
        courier: Option<CourierId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status,
            table,
            courier,
            created_at: timestamp,
            updated_at: timestamp,
            details: serde_json::Value::Null,
        }
    }

    /// Whether this is a salon (dine-in) order.
    pub fn is_salon(&self) -> bool {
        self.table.is_some()
    }

    /// Whether this is a delivery order.
    pub fn is_delivery(&self) -> bool {
        self.table.is_none()
    }

    /// Whether a courier has been assigned.
    pub fn has_assignee(&self) -> bool {
        self.courier.is_some()
    }
}
