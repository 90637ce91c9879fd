//! Record stores: the persistence contract and its variants.

pub mod document;
pub mod in_memory;
pub mod relational;
pub mod r#trait;

pub use document::DocumentStore;
pub use in_memory::{IdScheme, InMemoryStore};
pub use r#trait::{InventoryStore, ListQuery, StoreError, StoreResult};
pub use relational::RelationalStore;
