use std::sync::Arc;

use xrayradar_core::{radar_debug, registry};

use crate::defaults::apply_defaults;
use crate::{Client, ClientOptions};

/// Helper struct that is returned from `init`.
///
/// When this is dropped the client is closed and pending events are
/// drained within the configured shutdown timeout.
#[must_use = "when the init guard is dropped the transport will be shut down and no further \
              events can be sent.  If you do want to ignore this use mem::forget on it."]
pub struct ClientInitGuard(Arc<Client>);

impl ClientInitGuard {
    /// Quick check if the client is enabled.
    pub fn is_enabled(&self) -> bool {
        self.0.is_enabled()
    }

    /// Returns the client created by `init`.
    pub fn client(&self) -> Arc<Client> {
        self.0.clone()
    }
}

impl Drop for ClientInitGuard {
    fn drop(&mut self) {
        if self.is_enabled() {
            radar_debug!("dropping client guard -> disposing client");
        }
        self.0.close(None);
    }
}

/// Creates the xrayradar client for a given config and binds it
/// process-wide.
///
/// This applies environment defaults (`XRAYRADAR_DSN`,
/// `XRAYRADAR_AUTH_TOKEN`, `XRAYRADAR_ENVIRONMENT`, `XRAYRADAR_RELEASE`,
/// `XRAYRADAR_SERVER_NAME`), constructs the client, stores it as the
/// process-wide active reference and returns a guard.  Binding replaces a
/// previously active client without closing it; use
/// [`reset_global`](crate::reset_global) for an explicit teardown.
///
/// When the resulting client is enabled, has a DSN and no explicit
/// transport was supplied, automatic capture of unhandled panics is
/// installed; dropping the guard (or closing the client) uninstalls it
/// again.
///
/// # Examples
///
/// ```no_run
/// let _radar = xrayradar::init("https://xrayradar.example.com/proj_1");
/// ```
///
/// Or if draining on shutdown should be ignored:
///
/// ```no_run
/// std::mem::forget(xrayradar::init("https://xrayradar.example.com/proj_1"));
/// ```
pub fn init<C: Into<ClientOptions>>(cfg: C) -> ClientInitGuard {
    let options = apply_defaults(cfg.into());
    let client = Arc::new(Client::with_options(options));
    registry::bind_client(Some(client.clone()));

    if let Some(dsn) = client.dsn() {
        radar_debug!("enabled xrayradar client for DSN {}", dsn);
    } else if client.is_enabled() {
        radar_debug!("enabled xrayradar client without DSN");
    } else {
        radar_debug!("initialized disabled xrayradar client");
    }
    ClientInitGuard(client)
}
