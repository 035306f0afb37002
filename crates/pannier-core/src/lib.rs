//! # pannier-core
//!
//! Core abstractions for the pannier basket platform.
//!
//! This crate provides the foundational types and traits used across all
//! pannier components:
//!
//! - **Owner Identity**: Validated basket-owner identifiers
//! - **Storage Traits**: Abstract object-storage interface plus memory and
//!   cloud backends
//! - **Typed Keys**: Storage-key construction for basket objects
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization
//!
//! ## Crate Boundary
//!
//! `pannier-core` is the **only** crate allowed to define shared
//! primitives. Domain logic lives in `pannier-basket`; transport concerns
//! live in `pannier-api`.
//!
//! ## Example
//!
//! ```rust
//! use pannier_core::prelude::*;
//!
//! let owner = OwnerId::new("customer-42").unwrap();
//! let key = BasketKey::for_owner(&owner);
//! assert_eq!(key.as_str(), "baskets/customer-42.json");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod observability;
pub mod owner;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use pannier_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::keys::BasketKey;
    pub use crate::owner::OwnerId;
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, ObjectStoreBackend, StorageBackend, WritePrecondition,
        WriteResult,
    };
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use keys::BasketKey;
pub use observability::{LogFormat, init_logging};
pub use owner::OwnerId;
pub use storage::{
    MemoryBackend, ObjectMeta, ObjectStoreBackend, StorageBackend, WritePrecondition, WriteResult,
};
