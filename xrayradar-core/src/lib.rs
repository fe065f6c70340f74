//! This crate provides the core of the xrayradar SDK, which can be used to
//! capture exceptions, messages and ambient context and forward them to a
//! collector.
//!
//! # Core Concepts
//!
//! The crate is centered around the concepts of [`Client`], [`Scope`] and the
//! process-wide [`registry`], with the extension points via the [`Transport`]
//! and [`TransportFactory`] traits.
//!
//! A [`Client`] owns one [`Scope`] (the mutable bag of ambient context that
//! gets merged into every event), a resolved configuration snapshot
//! ([`ClientOptions`]) and a transport.  A client constructed with neither a
//! DSN, nor an explicit transport, nor `debug` is *disabled*: every capture
//! and mutation operation is a no-op returning `None`, with zero side
//! effects.
//!
//! Free functions like [`capture_message`] forward to the client bound into
//! the global registry and do nothing when none is bound.
//!
//! # Concurrency
//!
//! A client call is a single logical thread of control: breadcrumb and
//! context mutations are applied in call order on the same execution
//! context.  The only suspension points are a deferred `before_send` result
//! and the transport send itself, both of which are fire-and-forget from the
//! capture call's perspective.
//!
//! # Features
//!
//! - `feature = "test"`: Activates the `test` module, which can be used to
//!   write integration tests. It comes with a test transport which can
//!   capture all sent events for inspection.
#![warn(missing_docs)]

// macros; these need to be first to be used by other modules
#[macro_use]
mod macros;

mod api;
mod client;
mod clientoptions;
mod constants;
mod event;
mod hooks;
mod intodsn;
pub mod registry;
mod scope;
mod transport;

// public api or exports from this crate
pub use crate::api::*;
pub use crate::client::{CaptureOptions, Client};
pub use crate::clientoptions::{BeforeSend, BeforeSendCallback, ClientOptions};
pub use crate::constants::{SDK_INFO, USER_AGENT, VERSION};
pub use crate::event::{
    event_from_exception, event_from_message, normalize_level, parse_stack, parse_type_from_debug,
    should_sample, ExceptionInfo,
};
pub use crate::intodsn::IntoDsn;
pub use crate::scope::{ContextUpdate, Scope};
pub use crate::transport::{Transport, TransportFactory};

// test utilities
#[cfg(any(test, feature = "test"))]
pub mod test;

// public api from other crates
#[doc(inline)]
pub use xrayradar_types as types;
pub use xrayradar_types::protocol::v1 as protocol;
pub use xrayradar_types::protocol::v1::{Breadcrumb, Event, Level, User};
