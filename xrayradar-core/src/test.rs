//! This provides testing functionality for building tests.
//!
//! **Feature:** `test` (*disabled by default*)
//!
//! If the crate has been compiled with the test support feature this module
//! becomes available and provides functionality to capture events in a
//! block.
//!
//! # Example usage
//!
//! ```
//! use xrayradar_core::test::with_captured_events;
//! use xrayradar_core::{capture_message, CaptureOptions, Level};
//!
//! let events = with_captured_events(|| {
//!     capture_message("Hello World!", CaptureOptions::level(Level::Warning));
//! });
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].message.as_ref().unwrap(), "Hello World!");
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;

use crate::protocol::Event;
use crate::registry;
use crate::transport::Transport;
use crate::{Client, ClientOptions};

lazy_static! {
    // the registry is process-wide; tests driving it must not interleave
    static ref GLOBAL_TEST_LOCK: Mutex<()> = Mutex::new(());
}

/// Collects events instead of sending them.
///
/// # Examples
///
/// ```
/// use xrayradar_core::test::TestTransport;
/// use xrayradar_core::ClientOptions;
///
/// let transport = TestTransport::new();
/// let options = ClientOptions {
///     transport: Some(transport.clone()),
///     ..ClientOptions::default()
/// };
/// ```
pub struct TestTransport {
    collected: Mutex<Vec<Event>>,
}

impl TestTransport {
    /// Creates a new test transport.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Arc<TestTransport> {
        Arc::new(TestTransport {
            collected: Mutex::new(vec![]),
        })
    }

    /// Fetches and clears the contained events.
    pub fn fetch_and_clear_events(&self) -> Vec<Event> {
        let mut guard = self
            .collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl Transport for TestTransport {
    fn send_event(&self, event: Event) {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Runs some code with a client bound to a test transport and returns the
/// captured events.
///
/// This is a shortcut for calling [`with_captured_events_options`] with
/// default options.
pub fn with_captured_events<F: FnOnce()>(f: F) -> Vec<Event> {
    with_captured_events_options(f, ClientOptions::default())
}

/// Runs some code with a client configured from the given options bound to
/// a test transport, and returns the captured events.
///
/// If no DSN is set on the options a default test DSN is inserted.  The
/// transport on the options is overridden with a [`TestTransport`].
pub fn with_captured_events_options<F: FnOnce(), O: Into<ClientOptions>>(
    f: F,
    options: O,
) -> Vec<Event> {
    let _guard = GLOBAL_TEST_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let transport = TestTransport::new();
    let mut options = options.into();
    if options.dsn.is_none() {
        options.dsn = Some(
            "https://xrayradar.invalid/1"
                .parse()
                .expect("test dsn is valid"),
        );
    }
    options.transport = Some(transport.clone());

    let previous = registry::current_client();
    registry::bind_client(Some(Arc::new(Client::with_options(options))));
    f();
    registry::bind_client(previous);

    transport.fetch_and_clear_events()
}
