//! # pannier-basket
//!
//! Basket domain logic for the pannier platform:
//!
//! - **Model**: validated basket snapshots ([`BasketSnapshot`])
//! - **Delta**: item-count comparison between snapshots ([`compute_delta`])
//! - **Store**: snapshot persistence over the storage backend
//!   ([`BasketStore`])
//! - **Service**: get/update/delete orchestration ([`BasketService`])
//! - **Metrics**: add/remove counters and the live-items gauge
//!
//! The crate is transport-free; `pannier-api` maps HTTP requests onto
//! [`BasketService`] and [`BasketError`] onto status codes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pannier_basket::{BasketLine, BasketService, BasketStore, ProductId};
//! use pannier_core::{MemoryBackend, OwnerId};
//!
//! # async fn demo() -> pannier_basket::Result<()> {
//! let service = BasketService::new(BasketStore::new(Arc::new(MemoryBackend::new())));
//! let owner = OwnerId::new("customer-42").expect("valid owner");
//!
//! let update = service
//!     .update_basket(
//!         Some(&owner),
//!         &[BasketLine::new(ProductId::new(1), 2)],
//!     )
//!     .await?;
//! assert_eq!(update.delta.items_added, 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod delta;
pub mod error;
pub mod metrics;
pub mod model;
pub mod service;
pub mod store;

pub use delta::{BasketDelta, compute_delta};
pub use error::{BasketError, Result};
pub use model::{BasketItems, BasketLine, BasketSnapshot, ProductId};
pub use service::{BasketService, BasketUpdate};
pub use store::BasketStore;
