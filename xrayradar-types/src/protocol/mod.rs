//! This module exposes the types for the xrayradar protocol in different
//! versions.

pub mod v1;

/// The latest version of the protocol.
pub mod latest {
    pub use super::v1::*;
}
