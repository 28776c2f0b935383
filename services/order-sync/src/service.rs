//! Async coordination around the reconciliation engine
//!
//! `OrderSync` owns one [`SyncEngine`] per view instance and serializes all
//! mutation behind a single async mutex, so handlers never interleave
//! mid-update. Consumers read immutable snapshots through a watch channel
//! fired after every change; they never touch the working set directly.
//!
//! Overlapping fetches (a slow initialize racing a fresh one, or a poll
//! racing an initialize) are resolved by tagging every fetch with a
//! monotonically increasing epoch and discarding any result that a later
//! call superseded. A stale response is never allowed to clobber a fresher
//! working set, and the discard is silent — it is bookkeeping, not an
//! error.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use types::ids::OrderId;
use types::order::Order;
use types::view::ViewKind;

use crate::engine::{EngineEffect, ReconcileOutcome, SyncEngine};
use crate::events::PushEvent;
use crate::metrics::{MetricsSnapshot, SyncMetrics};
use crate::normalize::normalize_order;
use crate::source::{DataSource, SourceError};

/// Handle to one view's order synchronization state.
///
/// Cheap to clone; all clones share the same working set. Independent views
/// (salon floor and delivery board open side by side) each get their own
/// `OrderSync` and never share mutable state.
#[derive(Clone)]
pub struct OrderSync {
    inner: Arc<Inner>,
}

struct Inner {
    view: ViewKind,
    source: Arc<dyn DataSource>,
    engine: Mutex<SyncEngine>,
    /// Epoch of the most recently issued initialize/poll fetch.
    refresh_epoch: AtomicU64,
    /// Last reported push-channel connectivity. Starts optimistic; the
    /// poller tightens its cadence once a disconnect is reported.
    connected: AtomicBool,
    metrics: SyncMetrics,
    snapshot_tx: watch::Sender<Vec<Order>>,
}

impl OrderSync {
    /// Create a sync handle for one view, with an empty working set.
    pub fn new(view: ViewKind, source: Arc<dyn DataSource>) -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                view,
                source,
                engine: Mutex::new(SyncEngine::new(view)),
                refresh_epoch: AtomicU64::new(0),
                connected: AtomicBool::new(true),
                metrics: SyncMetrics::new(),
                snapshot_tx,
            }),
        }
    }

    /// The view this handle serves.
    pub fn view(&self) -> ViewKind {
        self.inner.view
    }

    /// Last reported push-channel connectivity.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Current working set in display order.
    pub async fn snapshot(&self) -> Vec<Order> {
        self.inner.engine.lock().await.snapshot()
    }

    /// Receiver fired with a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Order>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Point-in-time copy of the service counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Fetch the full active-order listing and replace the working set.
    ///
    /// Fail-closed: on source failure the working set becomes empty and the
    /// error is returned — stale-and-wrong is never shown. If a newer
    /// initialize or poll was issued while this one was in flight, the
    /// result (success or failure) is discarded without touching the set.
    pub async fn initialize(&self) -> Result<(), SourceError> {
        let epoch = self.next_epoch();
        debug!(view = %self.inner.view, epoch, "initialize issued");

        match self.inner.source.list_active(self.inner.view).await {
            Ok(orders) => {
                let mut engine = self.inner.engine.lock().await;
                if self.superseded(epoch) {
                    self.inner.metrics.record_stale_discard();
                    debug!(view = %self.inner.view, epoch, "initialize result superseded; discarded");
                    return Ok(());
                }
                engine.replace_all(orders);
                self.publish(&engine);
                let len = engine.len();
                drop(engine);
                self.inner.metrics.record_initialize_completed();
                info!(view = %self.inner.view, orders = len, "working set initialized");
                Ok(())
            }
            Err(err) => {
                let mut engine = self.inner.engine.lock().await;
                if self.superseded(epoch) {
                    self.inner.metrics.record_stale_discard();
                } else {
                    engine.clear();
                    self.publish(&engine);
                }
                drop(engine);
                self.inner.metrics.record_initialize_failed();
                warn!(view = %self.inner.view, error = %err, "initialize failed; working set cleared");
                Err(err)
            }
        }
    }

    /// One fallback reconciliation pass against the data source.
    ///
    /// Fail-soft: on source failure the working set is left untouched (the
    /// poll is a supplementary healing mechanism) and the error is
    /// returned. A result superseded by a newer fetch is discarded and
    /// reported as a no-op.
    pub async fn poll_fallback(&self) -> Result<ReconcileOutcome, SourceError> {
        let epoch = self.next_epoch();
        debug!(view = %self.inner.view, epoch, "fallback poll issued");

        match self.inner.source.list_active(self.inner.view).await {
            Ok(remote) => {
                let mut engine = self.inner.engine.lock().await;
                if self.superseded(epoch) {
                    self.inner.metrics.record_stale_discard();
                    debug!(view = %self.inner.view, epoch, "poll result superseded; discarded");
                    return Ok(ReconcileOutcome::default());
                }
                let outcome = engine.reconcile(remote);
                if !outcome.is_noop() {
                    self.publish(&engine);
                }
                drop(engine);
                self.inner.metrics.record_poll_completed();
                if outcome.is_noop() {
                    debug!(view = %self.inner.view, "fallback poll found no divergence");
                } else {
                    info!(
                        view = %self.inner.view,
                        added = outcome.added,
                        removed = outcome.removed,
                        patched = outcome.patched,
                        "fallback poll healed divergence"
                    );
                }
                Ok(outcome)
            }
            Err(err) => {
                self.inner.metrics.record_poll_failed();
                warn!(view = %self.inner.view, error = %err, "fallback poll failed; working set untouched");
                Err(err)
            }
        }
    }

    /// Feed one push-channel event through normalization and the engine.
    ///
    /// Malformed created frames are dropped silently (counted, logged at
    /// debug). A membership-affecting update triggers a full refresh of the
    /// view, whose source failure is the only error this can return.
    pub async fn handle_event(&self, event: PushEvent) -> Result<(), SourceError> {
        let event_id = event.event_id();
        match event {
            PushEvent::ConnectionChanged(up) => {
                self.inner.connected.store(up, Ordering::SeqCst);
                info!(view = %self.inner.view, connected = up, "push channel connectivity changed");
                Ok(())
            }
            PushEvent::Created { payload, .. } => {
                match normalize_order(payload, Utc::now()) {
                    Ok(order) => {
                        let id = order.id;
                        let effect = self.apply(|e| e.apply_created(order)).await;
                        debug!(
                            view = %self.inner.view,
                            order_id = %id,
                            event_id = ?event_id,
                            effect = ?effect,
                            "created event processed"
                        );
                        Ok(())
                    }
                    Err(err) => {
                        self.inner.metrics.record_event_malformed();
                        debug!(
                            view = %self.inner.view,
                            event_id = ?event_id,
                            error = %err,
                            "malformed created event dropped"
                        );
                        Ok(())
                    }
                }
            }
            PushEvent::Updated { order, .. } => self.apply_updated_order(order).await,
            PushEvent::StatusChanged { id, status, .. } => {
                let effect = self.apply(|e| e.apply_status_changed(id, status)).await;
                debug!(
                    view = %self.inner.view,
                    order_id = %id,
                    status = %status,
                    effect = ?effect,
                    "status change processed"
                );
                Ok(())
            }
            PushEvent::Deleted { id, .. } => {
                let effect = self.apply(|e| e.apply_deleted(id)).await;
                debug!(view = %self.inner.view, order_id = %id, effect = ?effect, "deletion processed");
                Ok(())
            }
        }
    }

    /// Refetch a single order (e.g. when a detail panel opens) and fold it
    /// into the working set with update semantics.
    pub async fn refresh_order(&self, id: OrderId) -> Result<(), SourceError> {
        let order = self.inner.source.get_order(id).await?;
        self.apply_updated_order(order).await
    }

    async fn apply_updated_order(&self, order: Order) -> Result<(), SourceError> {
        let id = order.id;
        let effect = self.apply(|e| e.apply_updated(order)).await;
        if effect == EngineEffect::ResyncRequired {
            warn!(
                view = %self.inner.view,
                order_id = %id,
                "update changed table/courier assignment; refetching whole view"
            );
            self.initialize().await?;
        }
        Ok(())
    }

    /// Run one engine mutation under the lock, publishing a snapshot when
    /// the set changed.
    async fn apply<F>(&self, mutate: F) -> EngineEffect
    where
        F: FnOnce(&mut SyncEngine) -> EngineEffect,
    {
        let mut engine = self.inner.engine.lock().await;
        let effect = mutate(&mut engine);
        if effect.changed_set() {
            self.publish(&engine);
        }
        drop(engine);

        match effect {
            EngineEffect::Inserted | EngineEffect::Replaced | EngineEffect::Removed => {
                self.inner.metrics.record_event_applied()
            }
            EngineEffect::Ignored => self.inner.metrics.record_event_ignored(),
            EngineEffect::ResyncRequired => self.inner.metrics.record_resync_forced(),
        }
        effect
    }

    /// Publish the current working set to subscribers. Called only while
    /// holding the engine lock so snapshots are observed in mutation order.
    fn publish(&self, engine: &SyncEngine) {
        self.inner.snapshot_tx.send_replace(engine.snapshot());
    }

    fn next_epoch(&self) -> u64 {
        self.inner.refresh_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn superseded(&self, epoch: u64) -> bool {
        self.inner.refresh_epoch.load(Ordering::SeqCst) != epoch
    }
}
