//! `stockpile-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the record stores
//! and the transport layer (no IO, no storage drivers).

pub mod backend;
pub mod error;
pub mod id;
pub mod page;

pub use backend::Backend;
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use page::{Page, PageRequest};
