//! Automatic capture of unhandled panics.
//!
//! When a client owns delivery end-to-end (a DSN is configured and no
//! explicit transport was supplied), binding it into the registry installs a
//! process panic hook that forwards every panic as a fatal exception
//! capture, flushes, and then chains to the previously registered hook.
//! Closing the client restores the pre-install hook chain.

use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, PoisonError};

use crate::client::{CaptureOptions, Client};
use crate::event::ExceptionInfo;
use crate::protocol::Level;
use crate::radar_debug;

type HookFn = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// The panic hook state a client keeps while its hook is installed.
pub(crate) struct InstalledHook {
    prev: Arc<HookFn>,
}

/// Extract the message of a panic.
fn message_from_panic_info<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    match info.payload().downcast_ref::<&'static str>() {
        Some(s) => s,
        None => match info.payload().downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<Any>",
        },
    }
}

/// Installs the panic hook for an eligible client.  Idempotent: a client
/// never installs twice.
pub(crate) fn install(client: &Arc<Client>) {
    if !client.owns_delivery() {
        return;
    }
    let mut guard = client.hook.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_some() {
        return;
    }

    let prev: Arc<HookFn> = Arc::new(panic::take_hook());
    let forward = prev.clone();
    let weak = Arc::downgrade(client);
    panic::set_hook(Box::new(move |info| {
        if let Some(client) = weak.upgrade() {
            capture_panic(&client, info);
        }
        (*forward)(info);
    }));
    *guard = Some(InstalledHook { prev });
    drop(guard);
    radar_debug!("[Hooks] installed panic hook");
}

/// Restores the pre-install hook chain.  Safe to call when nothing was
/// installed.
pub(crate) fn uninstall(client: &Client) {
    let taken = client
        .hook
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(hook) = taken {
        let prev = hook.prev;
        panic::set_hook(Box::new(move |info| (*prev)(info)));
        radar_debug!("[Hooks] uninstalled panic hook");
    }
}

fn capture_panic(client: &Client, info: &PanicHookInfo<'_>) {
    let message = message_from_panic_info(info);
    radar_debug!("[Hooks] panic detected: {}", message);
    let backtrace = Backtrace::force_capture().to_string();
    let error = ExceptionInfo::new("panic", message).with_stack(backtrace);
    client.capture_exception(error, CaptureOptions::level(Level::Fatal));
    client.flush(None);
}
