//! Service layer.
//!
//! This module contains services that interact with external systems and the
//! local fact data.
//!
//! # Components
//!
//! - `config_store` - Typed client for the remote configuration store
//! - `facts` - Static animal fact lists
//! - `transport` - Rate-limit-aware request execution

pub mod config_store;
pub mod facts;
pub mod transport;

pub use config_store::{ConfigStoreClient, SegmentKind};
pub use facts::{AnimalKind, FactsService};
pub use transport::RateLimitedTransport;
