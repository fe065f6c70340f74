use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use crate::clientoptions::{BeforeSend, ClientOptions};
use crate::event::{event_from_exception, event_from_message, should_sample, ExceptionInfo};
use crate::hooks::InstalledHook;
use crate::protocol::{Breadcrumb, Event, Level, Map, Value};
use crate::radar_debug;
use crate::scope::{ContextUpdate, Scope};
use crate::transport::Transport;
use crate::types::{Dsn, Uuid};
use crate::User;

/// Per-capture options.
///
/// `context` and `breadcrumbs` apply only to the one event being captured:
/// they are applied to a clone of the live scope, which itself stays
/// untouched.
#[derive(Debug, Default)]
pub struct CaptureOptions {
    /// Severity for this capture (defaults to error).
    pub level: Option<Level>,
    /// Message override for exception captures.
    pub message: Option<String>,
    /// Context applied only to this capture via a cloned scope overlay.
    pub context: Option<ContextUpdate>,
    /// Additional breadcrumbs appended at the end, only for this capture.
    pub breadcrumbs: Vec<Breadcrumb>,
}

impl CaptureOptions {
    /// Shortcut for options that only set a level.
    pub fn level(level: Level) -> CaptureOptions {
        CaptureOptions {
            level: Some(level),
            ..Default::default()
        }
    }
}

impl From<Level> for CaptureOptions {
    fn from(level: Level) -> CaptureOptions {
        CaptureOptions::level(level)
    }
}

/// The xrayradar client.
///
/// The client ties one [`Scope`], one transport and one resolved
/// configuration snapshot together and owns the decision of whether
/// capturing is enabled at all.  A client constructed with neither a DSN,
/// nor an explicit transport, nor `debug` is *disabled*: every capture and
/// mutation operation is a no-op returning `None` with zero side effects.
///
/// Enablement is computed once at construction and never re-evaluated;
/// reconfiguration means constructing (and binding) a new client.
pub struct Client {
    options: ClientOptions,
    scope: RwLock<Scope>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    pub(crate) hook: Mutex<Option<InstalledHook>>,
    owns_delivery: bool,
    enabled: bool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("dsn", &self.dsn())
            .field("options", &self.options)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl<T: Into<ClientOptions>> From<T> for Client {
    fn from(o: T) -> Client {
        Client::with_options(o.into())
    }
}

impl Client {
    /// Creates a new client from a config.
    ///
    /// # Supported Configs
    ///
    /// The following common values are supported for the client config:
    ///
    /// * `ClientOptions`: configure the client with the given client options.
    /// * `()` or empty string: disable the client.
    /// * `&str` / `String` / `&OsStr` / `OsString`: configure the client with
    ///   the given DSN.
    /// * `Dsn` / `&Dsn`: configure the client with a given DSN.
    /// * `(Dsn, ClientOptions)`: configure the client from the given DSN and
    ///   options.
    ///
    /// # Panics
    ///
    /// The `Into<ClientOptions>` implementations can panic for the forms
    /// where a DSN needs to be parsed.  If you want to handle invalid DSNs
    /// you need to parse them manually by calling parse on it and handle the
    /// error.
    pub fn from_config<O: Into<ClientOptions>>(opts: O) -> Client {
        Client::with_options(opts.into())
    }

    /// Creates a new client for the given options.
    ///
    /// If neither a DSN nor an explicit transport nor the debug flag is set
    /// on the options the client will be entirely disabled.
    pub fn with_options(mut options: ClientOptions) -> Client {
        options.sample_rate = options.sample_rate.clamp(0.0, 1.0);

        let explicit_transport = options.transport.is_some();
        let enabled = options.dsn.is_some() || explicit_transport || options.debug;

        let transport = if let Some(transport) = options.transport.clone() {
            Some(transport)
        } else if options.dsn.is_some() {
            options
                .transport_factory
                .as_ref()
                .map(|factory| factory.create_transport(&options))
        } else {
            None
        };
        let owns_delivery =
            enabled && options.dsn.is_some() && !explicit_transport && transport.is_some();

        let mut scope = Scope::new();
        scope.set_max_breadcrumbs(options.max_breadcrumbs);
        scope.apply_context_update(&ContextUpdate {
            environment: options.environment.as_ref().map(|v| v.to_string()),
            release: options.release.as_ref().map(|v| v.to_string()),
            server_name: options.server_name.as_ref().map(|v| v.to_string()),
            ..Default::default()
        });

        Client {
            options,
            scope: RwLock::new(scope),
            transport: RwLock::new(transport),
            hook: Mutex::new(None),
            owns_delivery,
            enabled,
        }
    }

    /// Returns the options of this client.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the DSN that constructed this client.
    pub fn dsn(&self) -> Option<&Dsn> {
        self.options.dsn.as_ref()
    }

    /// Quick check to see if the client is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True when the SDK owns delivery end-to-end: enabled, a DSN is
    /// configured and the transport came from the factory rather than the
    /// caller.  Only such clients install automatic-capture hooks.
    pub(crate) fn owns_delivery(&self) -> bool {
        self.owns_delivery
    }

    /// Returns a snapshot copy of the client's scope.
    pub fn scope(&self) -> Scope {
        self.scope
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captures an exception and sends it to the collector.
    ///
    /// Returns the event id, or `None` when the client is disabled, the
    /// capture was sampled out, `before_send` vetoed or deferred it.
    pub fn capture_exception(
        &self,
        error: ExceptionInfo,
        options: CaptureOptions,
    ) -> Option<Uuid> {
        if !self.enabled {
            return None;
        }
        if !should_sample(self.options.sample_rate) {
            radar_debug!(
                "[Client] capture dropped by sampling (rate: {})",
                self.options.sample_rate
            );
            return None;
        }
        let level = options.level.unwrap_or(Level::Error);
        let scope = self.scope_for_capture(&options);
        let event = event_from_exception(error, level, options.message, Some(&scope));
        self.finish_capture(event)
    }

    /// Captures a message and sends it to the collector.
    ///
    /// Same return contract as [`capture_exception`](Self::capture_exception).
    pub fn capture_message(&self, message: &str, options: CaptureOptions) -> Option<Uuid> {
        if !self.enabled {
            return None;
        }
        if !should_sample(self.options.sample_rate) {
            radar_debug!(
                "[Client] capture dropped by sampling (rate: {})",
                self.options.sample_rate
            );
            return None;
        }
        let level = options.level.unwrap_or(Level::Error);
        let scope = self.scope_for_capture(&options);
        let event = event_from_message(message, level, Some(&scope));
        self.finish_capture(event)
    }

    /// Builds the scope this capture sees: the live scope, or a clone with
    /// the per-capture overlay applied.  The live scope is never mutated.
    fn scope_for_capture(&self, options: &CaptureOptions) -> Scope {
        let mut scope = self.scope();
        if let Some(update) = &options.context {
            scope.apply_context_update(update);
        }
        for breadcrumb in &options.breadcrumbs {
            scope.add_breadcrumb(breadcrumb.clone());
        }
        scope
    }

    fn finish_capture(&self, event: Event) -> Option<Uuid> {
        let event = match &self.options.before_send {
            Some(callback) => match callback(event) {
                BeforeSend::Keep(event) => event,
                BeforeSend::Discard => {
                    radar_debug!("[Client] before_send dropped the event");
                    return None;
                }
                BeforeSend::Deferred(resolve) => {
                    self.spawn_deferred_send(resolve);
                    return None;
                }
            },
            None => event,
        };
        let event_id = event.event_id;
        self.emit_and_send(event);
        Some(event_id)
    }

    fn emit_and_send(&self, event: Event) {
        if self.options.debug {
            emit_payload(&event);
        }
        let event_id = event.event_id;
        if let Some(transport) = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            transport.send_event(event);
        } else {
            radar_debug!(
                "[Client] no transport available, event {} not delivered",
                event_id
            );
        }
    }

    /// Resolves a deferred `before_send` result off the capture call.  The
    /// capture itself has already returned `None`; once the closure yields
    /// an event it takes the same emit-and-send path as the synchronous
    /// case.
    fn spawn_deferred_send(&self, resolve: Box<dyn FnOnce() -> Option<Event> + Send>) {
        let transport = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let debug = self.options.debug;
        let spawned = thread::Builder::new()
            .name("xrayradar-before-send".into())
            .spawn(move || {
                if let Some(event) = resolve() {
                    if debug {
                        emit_payload(&event);
                    }
                    if let Some(transport) = transport {
                        transport.send_event(event);
                    }
                }
            });
        if spawned.is_err() {
            radar_debug!("[Client] failed to spawn deferred before_send worker");
        }
    }

    fn with_scope_mut<F: FnOnce(&mut Scope)>(&self, f: F) {
        if !self.enabled {
            return;
        }
        f(&mut self.scope.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Records a breadcrumb on the client's scope.
    ///
    /// No-op when the client is disabled; no sampling applies to context
    /// mutation, only to capture.
    pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.with_scope_mut(|scope| scope.add_breadcrumb(breadcrumb));
    }

    /// Deletes current breadcrumbs from the client's scope.
    pub fn clear_breadcrumbs(&self) {
        self.with_scope_mut(|scope| scope.clear_breadcrumbs());
    }

    /// Sets the user on the client's scope.  `None` clears it.
    pub fn set_user(&self, user: Option<User>) {
        self.with_scope_mut(|scope| scope.set_user(user));
    }

    /// Sets a tag on the client's scope.
    pub fn set_tag<V: ToString>(&self, key: &str, value: V) {
        self.with_scope_mut(|scope| scope.set_tag(key, value));
    }

    /// Sets an extra value on the client's scope.
    pub fn set_extra(&self, key: &str, value: Value) {
        self.with_scope_mut(|scope| scope.set_extra(key, value));
    }

    /// Sets a context mapping on the client's scope.
    ///
    /// `"user"` and `"request"` route into the dedicated slots, everything
    /// else lands under `extra[key]`.
    pub fn set_context(&self, key: &str, data: Map<String, Value>) {
        self.with_scope_mut(|scope| scope.set_context(key, data));
    }

    /// Drains all pending events without shutting down.
    pub fn flush(&self, timeout: Option<Duration>) -> bool {
        if let Some(transport) = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            transport.flush(timeout.unwrap_or(self.options.shutdown_timeout))
        } else {
            true
        }
    }

    /// Drains all pending events and shuts down the transport behind the
    /// client, then uninstalls any automatic-capture hooks this client
    /// installed.  After shutting down the transport is removed, making
    /// repeated calls safe.
    pub fn close(&self, timeout: Option<Duration>) -> bool {
        let transport = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let drained = if let Some(transport) = transport {
            transport.shutdown(timeout.unwrap_or(self.options.shutdown_timeout))
        } else {
            true
        };
        crate::hooks::uninstall(self);
        drained
    }
}

fn emit_payload(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => eprintln!("[xrayradar] {}", json),
        Err(err) => eprintln!(
            "[xrayradar] failed to serialize event {} for debug output: {}",
            event.event_id, err
        ),
    }
}

// Make this unwind safe. It's not out of the box because of the callbacks
// inside `ClientOptions`.
impl RefUnwindSafe for Client {}
