//! Order lifecycle states
//!
//! The lifecycle is `pending → preparing → {delivering | delivered} →
//! completed`, with `cancelled` reachable from any non-terminal state.
//! Table-origin orders may go `preparing → delivered` directly (no courier
//! hop); delivery-origin orders pass through `delivering`.
//!
//! The backend owns transition legality. This crate only names the states
//! and the active/terminal split the reconciliation engine keys off.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted, not yet in the kitchen.
    Pending,
    /// In the kitchen.
    Preparing,
    /// Out with a courier.
    Delivering,
    /// Served at the table; awaiting settlement.
    Delivered,
    /// Paid and closed (terminal).
    Completed,
    /// Cancelled by staff or customer (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Whether this status belongs to the active subset the reconciliation
    /// engine tracks.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Delivering
        )
    }

    /// Whether this status is terminal (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Canonical lowercase label, matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not a known lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized order status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    /// Parse a status label case-insensitively.
    ///
    /// Push feeds are inconsistent about casing (`"PENDING"`, `"Pending"`,
    /// `"pending"` all occur in the wild).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "delivering" => Ok(OrderStatus::Delivering),
            "delivered" => Ok(OrderStatus::Delivered),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_subset() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Preparing.is_active());
        assert!(OrderStatus::Delivering.is_active());
        assert!(!OrderStatus::Delivered.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        // Delivered is settled table service, not terminal: the backend may
        // still mutate it (payment, receipt) even though the engine does not
        // track it.
        assert!(!OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("PENDING".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("Preparing".parse::<OrderStatus>().unwrap(), OrderStatus::Preparing);
        assert_eq!("delivering".parse::<OrderStatus>().unwrap(), OrderStatus::Delivering);
        // US spelling tolerated.
        assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_parse_unknown_rejected() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err, ParseStatusError("shipped".to_string()));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivering).unwrap(),
            "\"delivering\""
        );
        let back: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, OrderStatus::Completed);
    }
}
