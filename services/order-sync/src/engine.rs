//! In-memory working-set reconciliation for a single view
//!
//! `SyncEngine` owns the canonical set of currently-relevant orders for one
//! view. The three input sources (initial fetch, push events, fallback
//! polls) all funnel through the mutation methods here, which are plain
//! `&mut self` and therefore atomic relative to each other once the async
//! layer serializes access.
//!
//! Set invariants:
//! - ids are unique within the set
//! - every entry is active (pending/preparing/delivering) and admitted by
//!   the view's membership predicate
//! - an observed transition out of the active subset removes the entry
//! - new entries prepend (most-recent-first); updates keep their position

use std::collections::HashSet;

use tracing::debug;
use types::ids::OrderId;
use types::order::Order;
use types::status::OrderStatus;
use types::view::ViewKind;

/// What a single mutation did to the working set.
///
/// The async layer uses this to decide whether to publish a fresh snapshot
/// and whether a full refresh of the view is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEffect {
    /// A previously untracked order entered the set (at the front).
    Inserted,
    /// A tracked order had its fields replaced in place.
    Replaced,
    /// A tracked order left the set.
    Removed,
    /// The event did not concern this view; the set is unchanged.
    Ignored,
    /// The event diverged from held state in a way that can change view
    /// membership. The set is unchanged; the caller must refetch the whole
    /// view rather than trust a local patch.
    ResyncRequired,
}

impl EngineEffect {
    /// Whether the working set changed and consumers need a new snapshot.
    pub fn changed_set(&self) -> bool {
        matches!(
            self,
            EngineEffect::Inserted | EngineEffect::Replaced | EngineEffect::Removed
        )
    }
}

/// Summary of one fallback-poll reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Orders present remotely but previously missing locally.
    pub added: usize,
    /// Orders held locally but no longer reported remotely.
    pub removed: usize,
    /// Orders present on both sides whose fields differed.
    pub patched: usize,
}

impl ReconcileOutcome {
    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.patched == 0
    }
}

/// The reconciliation engine for one view's working set.
#[derive(Debug)]
pub struct SyncEngine {
    view: ViewKind,
    /// Most-recent-first. Small (a restaurant's live orders), so linear id
    /// scans beat maintaining a separate index.
    working_set: Vec<Order>,
}

impl SyncEngine {
    /// Create an empty engine scoped to one view.
    pub fn new(view: ViewKind) -> Self {
        Self {
            view,
            working_set: Vec::new(),
        }
    }

    /// The view this engine serves.
    pub fn view(&self) -> ViewKind {
        self.view
    }

    /// Number of tracked orders.
    pub fn len(&self) -> usize {
        self.working_set.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.working_set.is_empty()
    }

    /// Whether an id is currently tracked.
    pub fn contains(&self, id: OrderId) -> bool {
        self.position(id).is_some()
    }

    /// Borrow a tracked order.
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.position(id).map(|i| &self.working_set[i])
    }

    /// Clone of the working set in display order.
    pub fn snapshot(&self) -> Vec<Order> {
        self.working_set.clone()
    }

    /// Drop everything. Used by the fail-closed initialize path.
    pub fn clear(&mut self) {
        self.working_set.clear();
    }

    /// Atomically replace the working set with the trackable subset of a
    /// full listing, preserving the listing's order. Never partially
    /// applied: the caller hands over the complete fetch result or nothing.
    pub fn replace_all(&mut self, orders: Vec<Order>) {
        let view = self.view;
        self.working_set = orders
            .into_iter()
            .filter(|o| is_trackable(view, o))
            .collect();
        debug_assert!(self.ids_unique());
    }

    /// Apply an order-created event.
    ///
    /// The push feed is not duplicate-free, so a known id is treated as an
    /// update (replace in place). New trackable orders prepend.
    pub fn apply_created(&mut self, order: Order) -> EngineEffect {
        if !is_trackable(self.view, &order) {
            debug!(order_id = %order.id, view = %self.view, "created event outside view; ignored");
            return EngineEffect::Ignored;
        }
        match self.position(order.id) {
            Some(idx) => {
                self.working_set[idx] = order;
                EngineEffect::Replaced
            }
            None => {
                self.working_set.insert(0, order);
                EngineEffect::Inserted
            }
        }
    }

    /// Apply a full-order update event.
    ///
    /// Precedence:
    /// 1. classification divergence (table/courier differ from held state)
    ///    ⇒ `ResyncRequired` — a partial event cannot be trusted to reflect
    ///    which view the order now belongs to, and a wrong local patch (an
    ///    order visible in two views after a transfer) is worse than an
    ///    extra round trip;
    /// 2. known id, still active and admitted ⇒ replace in place;
    /// 3. unknown id, active and admitted ⇒ treat as creation.
    ///
    /// A tracked order reported terminal or inadmissible is removed.
    /// Idempotent: re-applying the same update leaves the set unchanged
    /// apart from returning `Replaced` again.
    pub fn apply_updated(&mut self, order: Order) -> EngineEffect {
        match self.position(order.id) {
            Some(idx) => {
                let held = &self.working_set[idx];
                if held.table != order.table || held.courier != order.courier {
                    debug!(
                        order_id = %order.id,
                        view = %self.view,
                        "update changes table/courier assignment; full refresh required"
                    );
                    return EngineEffect::ResyncRequired;
                }
                if order.status.is_active() && self.view.admits(&order) {
                    self.working_set[idx] = order;
                    EngineEffect::Replaced
                } else {
                    let removed = self.working_set.remove(idx);
                    debug!(
                        order_id = %removed.id,
                        status = %order.status,
                        "tracked order left the active subset; removed"
                    );
                    EngineEffect::Removed
                }
            }
            None => {
                if order.status.is_active() && self.view.admits(&order) {
                    self.working_set.insert(0, order);
                    EngineEffect::Inserted
                } else {
                    EngineEffect::Ignored
                }
            }
        }
    }

    /// Apply a lightweight status-changed event.
    ///
    /// The event carries no fields beyond id and status, so membership is
    /// re-evaluated on the already-known order. Untracked ids are ignored —
    /// the engine never synthesizes a full order from a partial event.
    pub fn apply_status_changed(&mut self, id: OrderId, status: OrderStatus) -> EngineEffect {
        let Some(idx) = self.position(id) else {
            debug!(order_id = %id, "status change for untracked order; ignored");
            return EngineEffect::Ignored;
        };
        let still_admitted = self.view.admits(&self.working_set[idx]);
        if status.is_active() && still_admitted {
            self.working_set[idx].status = status;
            EngineEffect::Replaced
        } else {
            self.working_set.remove(idx);
            debug!(order_id = %id, status = %status, "status change removed order from view");
            EngineEffect::Removed
        }
    }

    /// Apply a deletion event: unconditional removal if present.
    pub fn apply_deleted(&mut self, id: OrderId) -> EngineEffect {
        match self.position(id) {
            Some(idx) => {
                self.working_set.remove(idx);
                EngineEffect::Removed
            }
            None => EngineEffect::Ignored,
        }
    }

    /// Reconcile against a fresh full listing from the data source.
    ///
    /// Computes the symmetric difference by id: remote-only orders are
    /// missed creations and prepend (in listing order); local-only orders
    /// were removed behind our back and are dropped; orders on both sides
    /// have their fields patched. Afterwards the set equals exactly the
    /// trackable subset of `remote`, healing any number of lost or
    /// reordered push events.
    pub fn reconcile(&mut self, remote: Vec<Order>) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        let view = self.view;
        let remote: Vec<Order> = remote
            .into_iter()
            .filter(|o| is_trackable(view, o))
            .collect();
        let remote_ids: HashSet<OrderId> = remote.iter().map(|o| o.id).collect();

        // Drop local entries the backend no longer reports.
        let before = self.working_set.len();
        self.working_set.retain(|o| remote_ids.contains(&o.id));
        outcome.removed = before - self.working_set.len();

        // Patch common orders in place; collect missed creations.
        let mut missing: Vec<Order> = Vec::new();
        for order in remote {
            match self.position(order.id) {
                Some(idx) => {
                    if self.working_set[idx] != order {
                        self.working_set[idx] = order;
                        outcome.patched += 1;
                    }
                }
                None => missing.push(order),
            }
        }

        if !missing.is_empty() {
            outcome.added = missing.len();
            // Missed creations go to the front as a block, keeping the
            // listing's own order among themselves.
            missing.extend(self.working_set.drain(..));
            self.working_set = missing;
        }

        debug_assert!(self.ids_unique());
        outcome
    }

    fn position(&self, id: OrderId) -> Option<usize> {
        self.working_set.iter().position(|o| o.id == id)
    }

    fn ids_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.working_set.iter().all(|o| seen.insert(o.id))
    }
}

/// Whether an order belongs in a view's working set at all: active status
/// and admitted by the membership predicate.
fn is_trackable(view: ViewKind, order: &Order) -> bool {
    order.status.is_active() && view.admits(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use types::ids::{CourierId, TableId};

    fn order(id: i64, status: OrderStatus, table: Option<i64>, courier: Option<i64>) -> Order {
        Order::new(
            OrderId::new(id),
            status,
            table.map(TableId::new),
            courier.map(CourierId::new),
            Utc.with_ymd_and_hms(2024, 2, 16, 18, 0, 0).unwrap(),
        )
    }

    fn salon(id: i64, table: i64) -> Order {
        order(id, OrderStatus::Pending, Some(table), None)
    }

    fn delivery(id: i64) -> Order {
        order(id, OrderStatus::Preparing, None, Some(4))
    }

    fn ids(engine: &SyncEngine) -> Vec<i64> {
        engine.snapshot().iter().map(|o| o.id.as_i64()).collect()
    }

    #[test]
    fn test_replace_all_filters_by_view() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![
            salon(1, 5),
            delivery(2),
            order(3, OrderStatus::Completed, Some(6), None),
        ]);
        // Order 2 lacks a table; order 3 is terminal.
        assert_eq!(ids(&engine), vec![1]);
    }

    #[test]
    fn test_created_prepends_and_dedupes() {
        let mut engine = SyncEngine::new(ViewKind::All);
        assert_eq!(engine.apply_created(salon(1, 5)), EngineEffect::Inserted);
        assert_eq!(engine.apply_created(delivery(2)), EngineEffect::Inserted);
        assert_eq!(ids(&engine), vec![2, 1]);

        // Duplicate delivery of the same creation replaces in place.
        assert_eq!(engine.apply_created(salon(1, 5)), EngineEffect::Replaced);
        assert_eq!(ids(&engine), vec![2, 1]);
    }

    #[test]
    fn test_created_ignores_terminal_and_foreign() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        assert_eq!(
            engine.apply_created(order(1, OrderStatus::Completed, Some(5), None)),
            EngineEffect::Ignored
        );
        assert_eq!(engine.apply_created(delivery(2)), EngineEffect::Ignored);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_updated_replaces_in_place_preserving_position() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5), salon(2, 6), salon(3, 7)]);

        let mut updated = salon(2, 6);
        updated.status = OrderStatus::Preparing;
        assert_eq!(engine.apply_updated(updated), EngineEffect::Replaced);
        assert_eq!(ids(&engine), vec![1, 2, 3]);
        assert_eq!(
            engine.get(OrderId::new(2)).unwrap().status,
            OrderStatus::Preparing
        );
    }

    #[test]
    fn test_updated_is_idempotent() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5)]);

        let mut updated = salon(1, 5);
        updated.status = OrderStatus::Preparing;
        engine.apply_updated(updated.clone());
        let once = engine.snapshot();
        engine.apply_updated(updated);
        assert_eq!(engine.snapshot(), once);
    }

    #[test]
    fn test_updated_terminal_removes() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5), salon(2, 6)]);

        let mut done = salon(1, 5);
        done.status = OrderStatus::Completed;
        assert_eq!(engine.apply_updated(done), EngineEffect::Removed);
        assert_eq!(ids(&engine), vec![2]);
    }

    #[test]
    fn test_updated_unknown_active_inserts() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5)]);
        assert_eq!(engine.apply_updated(salon(3, 9)), EngineEffect::Inserted);
        assert_eq!(ids(&engine), vec![3, 1]);
    }

    #[test]
    fn test_updated_unknown_terminal_ignored() {
        let mut engine = SyncEngine::new(ViewKind::All);
        assert_eq!(
            engine.apply_updated(order(9, OrderStatus::Cancelled, None, None)),
            EngineEffect::Ignored
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn test_updated_assignment_divergence_requires_resync() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5)]);

        // Transfer: table dropped, courier assigned. The engine must not
        // guess; it asks for a full refresh and leaves the set alone.
        let transferred = order(1, OrderStatus::Preparing, None, Some(4));
        assert_eq!(
            engine.apply_updated(transferred),
            EngineEffect::ResyncRequired
        );
        assert_eq!(ids(&engine), vec![1]);
    }

    #[test]
    fn test_status_changed_patches_in_place() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5), salon(2, 6)]);

        assert_eq!(
            engine.apply_status_changed(OrderId::new(2), OrderStatus::Preparing),
            EngineEffect::Replaced
        );
        assert_eq!(ids(&engine), vec![1, 2]);
        assert_eq!(
            engine.get(OrderId::new(2)).unwrap().status,
            OrderStatus::Preparing
        );
    }

    #[test]
    fn test_status_changed_terminal_removes() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5)]);
        assert_eq!(
            engine.apply_status_changed(OrderId::new(1), OrderStatus::Completed),
            EngineEffect::Removed
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn test_status_changed_untracked_ignored() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        assert_eq!(
            engine.apply_status_changed(OrderId::new(7), OrderStatus::Pending),
            EngineEffect::Ignored
        );
        assert!(engine.is_empty());
    }

    #[test]
    fn test_deleted_removes_unconditionally() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5)]);
        assert_eq!(engine.apply_deleted(OrderId::new(1)), EngineEffect::Removed);
        assert_eq!(engine.apply_deleted(OrderId::new(1)), EngineEffect::Ignored);
    }

    #[test]
    fn test_reconcile_converges_to_remote() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5), salon(2, 6)]);

        // Remote truth: order 2 vanished, order 3 was missed, order 1
        // progressed to preparing.
        let mut one = salon(1, 5);
        one.status = OrderStatus::Preparing;
        let remote = vec![one, salon(3, 9), delivery(4)];

        let outcome = engine.reconcile(remote);
        assert_eq!(
            outcome,
            ReconcileOutcome {
                added: 1,
                removed: 1,
                patched: 1
            }
        );
        // Missed creation 3 is prepended; delivery 4 fails the predicate.
        assert_eq!(ids(&engine), vec![3, 1]);
        assert_eq!(
            engine.get(OrderId::new(1)).unwrap().status,
            OrderStatus::Preparing
        );
    }

    #[test]
    fn test_reconcile_identical_listing_is_noop() {
        let mut engine = SyncEngine::new(ViewKind::Salon);
        engine.replace_all(vec![salon(1, 5), salon(2, 6)]);
        let outcome = engine.reconcile(vec![salon(1, 5), salon(2, 6)]);
        assert!(outcome.is_noop());
        assert_eq!(ids(&engine), vec![1, 2]);
    }

    // Random event sequences must never violate the set invariants.
    proptest! {
        #[test]
        fn prop_invariants_hold_under_arbitrary_events(
            events in proptest::collection::vec((0u8..5, 0i64..8, 0u8..6, proptest::option::of(0i64..4)), 0..64)
        ) {
            let statuses = [
                OrderStatus::Pending,
                OrderStatus::Preparing,
                OrderStatus::Delivering,
                OrderStatus::Delivered,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ];
            let mut engine = SyncEngine::new(ViewKind::Salon);

            for (op, id, status_idx, table) in events {
                let status = statuses[status_idx as usize];
                let o = order(id, status, table, None);
                match op {
                    0 => { engine.apply_created(o); }
                    1 => { engine.apply_updated(o); }
                    2 => { engine.apply_status_changed(OrderId::new(id), status); }
                    3 => { engine.apply_deleted(OrderId::new(id)); }
                    _ => { engine.reconcile(vec![o]); }
                }

                let snapshot = engine.snapshot();
                let mut seen = HashSet::new();
                for tracked in &snapshot {
                    prop_assert!(seen.insert(tracked.id), "duplicate id in working set");
                    prop_assert!(tracked.status.is_active(), "terminal order tracked");
                    prop_assert!(ViewKind::Salon.admits(tracked), "inadmissible order tracked");
                }
            }
        }
    }
}
