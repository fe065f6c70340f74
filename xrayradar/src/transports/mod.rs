//! The provided transports.
//!
//! This module exposes the HTTP transport that is compiled into the library
//! when the `transport` feature (on by default) is enabled.

use std::sync::Arc;

use crate::{ClientOptions, Transport, TransportFactory};

mod http;
mod thread;

pub use http::HttpTransport;

/// Creates the default HTTP transport.
///
/// This is what `init` injects into the client options so that a
/// configuration consisting of nothing but a DSN gets working delivery.
#[derive(Clone)]
pub struct DefaultTransportFactory;

impl TransportFactory for DefaultTransportFactory {
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport> {
        Arc::new(HttpTransport::new(options))
    }
}
