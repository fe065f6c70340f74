//! Free functions forwarding to the process-wide active client.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{CaptureOptions, Client};
use crate::event::ExceptionInfo;
use crate::protocol::{Breadcrumb, Map, User, Value};
use crate::registry;
use crate::types::Uuid;

/// Returns the process-wide active client, or `None` when none is bound.
pub fn get_client() -> Option<Arc<Client>> {
    registry::current_client()
}

/// Closes the active client (if any) and clears the reference.
pub fn reset_global() {
    if let Some(client) = registry::take_client() {
        client.close(None);
    }
}

/// Captures an exception on the currently active client if any.
///
/// Returns the event id, or `None` when no client is bound, the client is
/// disabled, the capture was sampled out, or `before_send` vetoed or
/// deferred it.
///
/// # Example
///
/// ```
/// use xrayradar_core::{capture_exception, ExceptionInfo};
///
/// capture_exception(
///     ExceptionInfo::new("TimeoutError", "upstream did not respond"),
///     Default::default(),
/// );
/// ```
pub fn capture_exception(error: ExceptionInfo, options: CaptureOptions) -> Option<Uuid> {
    get_client().and_then(|client| client.capture_exception(error, options))
}

/// Captures any `std::error::Error` on the currently active client.
///
/// # Example
///
/// ```
/// xrayradar_core::capture_error(&std::io::Error::last_os_error());
/// ```
pub fn capture_error<E: std::error::Error + ?Sized>(error: &E) -> Option<Uuid> {
    capture_exception(ExceptionInfo::from_error(error), Default::default())
}

/// Captures an arbitrary message on the currently active client if any.
///
/// # Example
///
/// ```
/// use xrayradar_core::{capture_message, CaptureOptions, Level};
///
/// capture_message("Hello World!", CaptureOptions::level(Level::Info));
/// ```
pub fn capture_message(message: &str, options: CaptureOptions) -> Option<Uuid> {
    get_client().and_then(|client| client.capture_message(message, options))
}

/// Records a breadcrumb on the active client's scope.
///
/// The total number of breadcrumbs that can be recorded is limited by the
/// client's `max_breadcrumbs` configuration; the oldest are evicted first.
pub fn add_breadcrumb(breadcrumb: Breadcrumb) {
    if let Some(client) = get_client() {
        client.add_breadcrumb(breadcrumb);
    }
}

/// Sets the user on the active client's scope.  `None` clears it.
pub fn set_user(user: Option<User>) {
    if let Some(client) = get_client() {
        client.set_user(user);
    }
}

/// Sets a tag on the active client's scope.
pub fn set_tag<V: ToString>(key: &str, value: V) {
    if let Some(client) = get_client() {
        client.set_tag(key, value);
    }
}

/// Sets an extra value on the active client's scope.
pub fn set_extra(key: &str, value: Value) {
    if let Some(client) = get_client() {
        client.set_extra(key, value);
    }
}

/// Sets a context mapping on the active client's scope.
pub fn set_context(key: &str, data: Map<String, Value>) {
    if let Some(client) = get_client() {
        client.set_context(key, data);
    }
}

/// Flushes the active client's transport.
pub fn flush(timeout: Option<Duration>) -> bool {
    match get_client() {
        Some(client) => client.flush(timeout),
        None => true,
    }
}
