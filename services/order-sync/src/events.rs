//! Push-feed event definitions
//!
//! The push channel is best-effort: at-most-once per event, no delivery or
//! ordering guarantee. Created frames arrive as loosely-typed JSON (field
//! naming varies by backend version) and pass through the normalization
//! boundary; the other frames carry already-typed data.
//!
//! Each lifecycle frame may carry an event id for log correlation. It is
//! diagnostic only — the feed gives no sequencing to build on.

use types::ids::OrderId;
use types::order::Order;
use types::status::OrderStatus;
use uuid::Uuid;

/// One event delivered by the push channel subscription.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// A new order was reported. The payload shape is not trusted and must
    /// be normalized before the engine sees it.
    Created {
        event_id: Option<Uuid>,
        payload: serde_json::Value,
    },
    /// A full order object was reported changed.
    Updated {
        event_id: Option<Uuid>,
        order: Order,
    },
    /// Lightweight status transition: id and new status only.
    StatusChanged {
        event_id: Option<Uuid>,
        id: OrderId,
        status: OrderStatus,
    },
    /// An order was deleted backend-side.
    Deleted {
        event_id: Option<Uuid>,
        id: OrderId,
    },
    /// Push-channel connectivity changed. `true` means connected; while
    /// disconnected the fallback poller tightens its interval.
    ConnectionChanged(bool),
}

impl PushEvent {
    /// Event type as a string label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            PushEvent::Created { .. } => "created",
            PushEvent::Updated { .. } => "updated",
            PushEvent::StatusChanged { .. } => "status_changed",
            PushEvent::Deleted { .. } => "deleted",
            PushEvent::ConnectionChanged(_) => "connection_changed",
        }
    }

    /// The correlation id carried by the frame, if any.
    pub fn event_id(&self) -> Option<Uuid> {
        match self {
            PushEvent::Created { event_id, .. }
            | PushEvent::Updated { event_id, .. }
            | PushEvent::StatusChanged { event_id, .. }
            | PushEvent::Deleted { event_id, .. } => *event_id,
            PushEvent::ConnectionChanged(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_labels() {
        let e = PushEvent::Deleted {
            event_id: None,
            id: OrderId::new(1),
        };
        assert_eq!(e.label(), "deleted");
        assert_eq!(PushEvent::ConnectionChanged(true).label(), "connection_changed");
    }

    #[test]
    fn test_event_id_extraction() {
        let id = Uuid::now_v7();
        let e = PushEvent::StatusChanged {
            event_id: Some(id),
            id: OrderId::new(2),
            status: OrderStatus::Preparing,
        };
        assert_eq!(e.event_id(), Some(id));
        assert_eq!(PushEvent::ConnectionChanged(false).event_id(), None);
    }
}
