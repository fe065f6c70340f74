//! This crate provides support for logging events and errors to the
//! XrayRadar collector.  The user-facing parts of the SDK live here: the
//! [`init`] entry point with environment-variable defaults and the HTTP
//! transport that delivers events to the store endpoint.
//!
//! The event construction and scope-management engine itself lives in
//! `xrayradar-core` and is re-exported here in its entirety.
//!
//! # Quickstart
//!
//! The most convenient way to use this library is the [`init`] function,
//! which configures the client, binds it process-wide and returns a guard
//! that flushes pending events when dropped.
//!
//! ```no_run
//! let _guard = xrayradar::init("https://xrayradar.example.com/proj_1");
//! xrayradar::capture_message("Hello World!", Default::default());
//! // the guard flushes and closes the client when it goes out of scope
//! ```
//!
//! More settings can be supplied through [`ClientOptions`]:
//!
//! ```no_run
//! let _guard = xrayradar::init((
//!     "https://xrayradar.example.com/proj_1",
//!     xrayradar::ClientOptions {
//!         release: Some("my-app@1.0.0".into()),
//!         sample_rate: 0.5,
//!         ..Default::default()
//!     },
//! ));
//! ```
//!
//! Ambient context is recorded on the client's scope and merged into every
//! event built while it is active:
//!
//! ```no_run
//! xrayradar::set_tag("region", "eu-west-1");
//! xrayradar::add_breadcrumb(xrayradar::Breadcrumb {
//!     message: "cache warmed".into(),
//!     ..Default::default()
//! });
//! ```
//!
//! # Features
//!
//! - `transport` (default): the `ureq`-based HTTP transport used for
//!   delivery when only a DSN is configured.
//! - `test`: test utilities with a collecting transport.
#![warn(missing_docs)]

pub use xrayradar_core::*;

mod defaults;
mod init;
pub use crate::init::{init, ClientInitGuard};

#[cfg(feature = "transport")]
pub mod transports;
#[cfg(feature = "transport")]
pub use crate::transports::HttpTransport;
