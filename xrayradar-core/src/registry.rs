//! The process-wide client registry.
//!
//! There is at most one active client per process.  [`bind_client`] stores a
//! new active reference (and installs the client's automatic-capture hooks
//! when it owns delivery); it does *not* close a previously bound client —
//! only [`reset_global`](crate::reset_global) or an explicit
//! [`Client::close`](crate::Client::close) does that.  Nothing is ever
//! auto-created: when no client is bound the free functions are no-ops.

use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

use crate::client::Client;

lazy_static! {
    static ref GLOBAL_CLIENT: RwLock<Option<Arc<Client>>> = RwLock::new(None);
}

/// Returns the currently bound client, if any.
pub fn current_client() -> Option<Arc<Client>> {
    GLOBAL_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Binds a client as the process-wide active one, or unbinds with `None`.
///
/// Binding an eligible client installs its automatic-capture hooks.  The
/// previously bound client (if any) is replaced but not closed.
pub fn bind_client(client: Option<Arc<Client>>) {
    if let Some(client) = &client {
        crate::hooks::install(client);
    }
    *GLOBAL_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = client;
}

/// Takes the currently bound client out of the registry.
pub(crate) fn take_client() -> Option<Arc<Client>> {
    GLOBAL_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}
