//! Order Sync Service
//!
//! Maintains a consistent, deduplicated, filtered view of active restaurant
//! orders for one frontend view, fed by three uncoordinated sources:
//! - an initial full fetch from the backend data source
//! - a best-effort push feed of order lifecycle events
//! - a periodic fallback poll that heals divergence from missed events
//!
//! # Architecture
//!
//! ```text
//!  DataSource (REST)          Push feed (events)
//!        │                          │
//!        │ initialize /         ┌───▼──────┐
//!        │ poll_fallback        │Normalize │ ← maps loose payloads to the
//!        │                      └───┬──────┘   canonical order shape
//!    ┌───▼──────────────────────────▼───┐
//!    │            SyncEngine            │ ← one working set per view,
//!    │  (dedup, membership, ordering)   │   mutations serialized
//!    └───┬──────────────────────────────┘
//!        │ snapshot on every change
//!    ┌───▼──────────┐
//!    │ watch channel│ → presentation layer
//!    └──────────────┘
//! ```
//!
//! The engine owns which orders are *currently relevant to display*; it
//! never invents or deletes backend orders. Pricing, persistence, and
//! lifecycle authority stay with the backend.

pub mod engine;
pub mod events;
pub mod metrics;
pub mod normalize;
pub mod poller;
pub mod service;
pub mod source;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
