//! Infrastructure layer: record stores, backend selection, config, bootstrap.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod facade;
pub mod store;

mod integration_tests;

pub use context::{CancelHandle, Interrupted, OperationContext};
pub use facade::{InventoryError, InventoryFacade, InventoryResult};
