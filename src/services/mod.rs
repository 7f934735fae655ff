//! Service layer: the data core behind the HTTP facade.
//!
//! Baseline stock provider, delivery store, summary and reconciliation
//! engines, region confirmation workflow and file transfer.

pub mod confirmation;
pub mod inventory;
pub mod reconciliation;
pub mod store;
pub mod summary;
pub mod transfer;

pub use confirmation::ConfirmationWorkflow;
pub use inventory::InventoryService;
pub use store::DeliveryStore;
