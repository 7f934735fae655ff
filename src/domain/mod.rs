//! Domain types and DTOs
//!
//! Typed data model for delivery tracking: records, summaries,
//! reconciliation rows and region confirmations.

pub mod catalog;
pub mod confirmation;
pub mod delivery;
pub mod reconciliation;
pub mod summary;

// Re-export commonly used types
pub use confirmation::*;
pub use delivery::*;
pub use reconciliation::*;
pub use summary::*;
