//! Data-source contract consumed by the sync service
//!
//! The backend owns all business logic; the engine only needs two read
//! operations from it. Implementations (REST adapters, test doubles) must
//! not return partially-normalized entries — ids and statuses are present
//! or the entry is omitted upstream.

use async_trait::async_trait;
use thiserror::Error;
use types::ids::OrderId;
use types::order::Order;
use types::view::ViewKind;

/// Errors surfaced by a data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("data source unreachable: {reason}")]
    Unavailable { reason: String },

    #[error("backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("order not found: {id}")]
    NotFound { id: OrderId },

    #[error("response could not be decoded: {reason}")]
    Decode { reason: String },
}

/// Read-side contract against the backend.
///
/// `list_active` is expected to be scoped server-side for
/// [`ViewKind::CourierOwn`] (the caller's identity travels with the
/// request, not through the engine).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the full current set of active orders relevant to a view.
    async fn list_active(&self, view: ViewKind) -> Result<Vec<Order>, SourceError>;

    /// Fetch a single order by id.
    async fn get_order(&self, id: OrderId) -> Result<Order, SourceError>;
}
