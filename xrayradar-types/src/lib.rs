//! This crate provides common types for working with the xrayradar protocol
//! or an xrayradar collector.  It's used by the Rust SDK to assemble the
//! payloads that are sent to the store endpoint.
//!
//! Most of the types in this crate are serializable in one form or another.
//! The types in the [`protocol`] module are generally only serializable to
//! JSON as other formats are not supported by the collector at this date.
//!
//! ## Contents
//!
//! The crate provides a bunch of common types for working with xrayradar as
//! such (DSNs, project IDs) as well as types for the event protocol.
//!
//! Right now only `v1` of the protocol is implemented but it's versioned so
//! later versions might be added later.
//!
//! ## API Concepts
//!
//! Most types are directly serializable and deserializable and try to
//! implement the `Default` trait.  This means that objects can be created
//! conveniently and missing attributes can be filled in:
//!
//! ```rust
//! use xrayradar_types::protocol::v1;
//!
//! let event = v1::Event {
//!     message: Some("Hello World!".to_string()),
//!     level: v1::Level::Info,
//!     ..Default::default()
//! };
//! ```
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod dsn;
mod project_id;
pub mod protocol;
pub mod utils;

pub use crate::dsn::*;
pub use crate::project_id::*;

// Re-export external types and traits for convenience
pub use uuid::Uuid;

/// Returns a new random event id.
pub fn random_uuid() -> Uuid {
    Uuid::new_v4()
}
