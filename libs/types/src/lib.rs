//! Types library for the restaurant order platform
//!
//! This library provides the domain vocabulary shared between the order
//! reconciliation engine and any data-source implementation: identifier
//! newtypes, the order lifecycle state machine, the canonical order shape,
//! and the per-view membership predicate.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TableId, CourierId)
//! - `status`: Order lifecycle states and the active/terminal split
//! - `order`: The canonical order shape
//! - `view`: View classification and membership predicates

// Public modules
pub mod ids;
pub mod order;
pub mod status;
pub mod view;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::order::*;
    pub use crate::status::*;
    pub use crate::view::*;
}
