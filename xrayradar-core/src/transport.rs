use std::sync::Arc;
use std::time::Duration;

use crate::clientoptions::ClientOptions;
use crate::protocol::Event;

/// The trait for transports.
///
/// A transport takes a finished event payload and attempts delivery to the
/// collector.  Delivery is best-effort and fire-and-forget: failures are the
/// transport's own business (a diagnostic log at most) and must never reach
/// the capture call that triggered the send.
pub trait Transport: Send + Sync + 'static {
    /// Sends an event.
    fn send_event(&self, event: Event);

    /// Drains the transport queue.
    ///
    /// Returns `true` when the queue was drained within the timeout.
    fn flush(&self, timeout: Duration) -> bool {
        let _ = timeout;
        true
    }

    /// Flushes the transport queue and shuts it down.
    fn shutdown(&self, timeout: Duration) -> bool {
        self.flush(timeout)
    }
}

/// A factory creating the SDK-owned delivery transport.
///
/// This is what the umbrella crate injects so that a client configured with
/// only a DSN gets a working HTTP transport.  An explicitly supplied
/// [`Transport`] instance on the options always wins over the factory.
pub trait TransportFactory: Send + Sync {
    /// Given the options, creates a transport.
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&ClientOptions) -> Arc<dyn Transport> + Send + Sync,
{
    fn create_transport(&self, options: &ClientOptions) -> Arc<dyn Transport> {
        self(options)
    }
}
