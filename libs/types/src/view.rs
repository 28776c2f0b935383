//! View classification and membership predicates
//!
//! Each open screen of the frontend (salon floor, delivery board, combined
//! list, a courier's own register) owns an independent working set scoped
//! by one of these view kinds. The predicate decides set membership from
//! the order's classification fields alone.
//!
//! Caller identity for `CourierOwn` is applied upstream by scoping the
//! data-source query; the predicate here only checks the shape.

use crate::order::Order;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which slice of active orders a view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Dine-in orders: has a table reference.
    Salon,
    /// Delivery orders: no table reference.
    Delivery,
    /// Every active order.
    All,
    /// A courier's own assigned deliveries: no table, has an assignee.
    CourierOwn,
}

impl ViewKind {
    /// Membership predicate: does `order` belong in this view's working set?
    ///
    /// Status is judged separately (only active orders are tracked at all);
    /// this predicate covers classification only.
    pub fn admits(&self, order: &Order) -> bool {
        match self {
            ViewKind::Salon => order.table.is_some(),
            ViewKind::Delivery => order.table.is_none(),
            ViewKind::All => true,
            ViewKind::CourierOwn => order.table.is_none() && order.courier.is_some(),
        }
    }

    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Salon => "salon",
            ViewKind::Delivery => "delivery",
            ViewKind::All => "all",
            ViewKind::CourierOwn => "courier_own",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CourierId, OrderId, TableId};
    use crate::status::OrderStatus;
    use chrono::{TimeZone, Utc};

    fn order(table: Option<i64>, courier: Option<i64>) -> Order {
        Order::new(
            OrderId::new(1),
            OrderStatus::Pending,
            table.map(TableId::new),
            courier.map(CourierId::new),
            Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_salon_requires_table() {
        assert!(ViewKind::Salon.admits(&order(Some(3), None)));
        assert!(!ViewKind::Salon.admits(&order(None, Some(8))));
        assert!(!ViewKind::Salon.admits(&order(None, None)));
    }

    #[test]
    fn test_delivery_excludes_tables() {
        assert!(ViewKind::Delivery.admits(&order(None, None)));
        assert!(ViewKind::Delivery.admits(&order(None, Some(8))));
        assert!(!ViewKind::Delivery.admits(&order(Some(3), None)));
    }

    #[test]
    fn test_courier_own_needs_assignee_and_no_table() {
        assert!(ViewKind::CourierOwn.admits(&order(None, Some(8))));
        assert!(!ViewKind::CourierOwn.admits(&order(None, None)));
        assert!(!ViewKind::CourierOwn.admits(&order(Some(3), Some(8))));
    }

    #[test]
    fn test_all_admits_everything() {
        assert!(ViewKind::All.admits(&order(None, None)));
        assert!(ViewKind::All.admits(&order(Some(3), Some(8))));
    }
}
