use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::USER_AGENT;
use crate::protocol::Event;
use crate::transport::{Transport, TransportFactory};
use crate::types::Dsn;
use crate::IntoDsn;

/// The result of the `before_send` hook.
///
/// The hook may pass the event through (possibly modified), veto it, or
/// defer the decision.  A deferred decision is resolved off the capture
/// call: the capture returns `None` immediately and the event (if the
/// deferred computation yields one) is handed to the transport once the
/// computation completes.
pub enum BeforeSend {
    /// Send this (possibly modified) event.
    Keep(Event),
    /// Veto: nothing is sent.
    Discard,
    /// Defer the decision; resolved on a background thread.
    Deferred(Box<dyn FnOnce() -> Option<Event> + Send + 'static>),
}

impl From<Option<Event>> for BeforeSend {
    fn from(event: Option<Event>) -> BeforeSend {
        match event {
            Some(event) => BeforeSend::Keep(event),
            None => BeforeSend::Discard,
        }
    }
}

impl From<Event> for BeforeSend {
    fn from(event: Event) -> BeforeSend {
        BeforeSend::Keep(event)
    }
}

/// Type alias for the before_send callback.
pub type BeforeSendCallback = Arc<dyn Fn(Event) -> BeforeSend + Send + Sync>;

/// Configuration settings for the client.
///
/// # Examples
///
/// ```
/// let _options = xrayradar_core::ClientOptions {
///     debug: true,
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct ClientOptions {
    /// The DSN to use.  If not set (and no transport and no debug flag is
    /// set) the client is effectively disabled.
    pub dsn: Option<Dsn>,
    /// The token sent as `X-Xrayradar-Token` with every store request.
    pub auth_token: Option<String>,
    /// Enables debug mode.
    ///
    /// In debug mode diagnostic information and every outgoing payload are
    /// printed to stderr to help you understand what the SDK is doing.
    pub debug: bool,
    /// The environment to be sent with events.
    pub environment: Option<Cow<'static, str>>,
    /// The release to be sent with events.
    pub release: Option<Cow<'static, str>>,
    /// The server name to be reported.
    pub server_name: Option<Cow<'static, str>>,
    /// The sample rate for event submission. (0.0 - 1.0, defaults to 1.0,
    /// clamped at client construction)
    pub sample_rate: f32,
    /// Maximum number of breadcrumbs. (defaults to 100)
    pub max_breadcrumbs: usize,
    /// Callback that is executed before event sending.
    pub before_send: Option<BeforeSendCallback>,
    /// An explicitly supplied transport.
    ///
    /// When set, the SDK delivers through it and never installs its own
    /// delivery or automatic-capture hooks.
    pub transport: Option<Arc<dyn Transport>>,
    /// The factory producing the SDK-owned default transport when a DSN is
    /// configured and no explicit transport was supplied.
    pub transport_factory: Option<Arc<dyn TransportFactory>>,
    /// The user agent that should be reported.
    pub user_agent: Cow<'static, str>,
    /// The timeout on client drop for draining events on shutdown.
    pub shutdown_timeout: Duration,
}

impl ClientOptions {
    /// Creates new Options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a callback that is executed before event sending.
    ///
    /// The callback may return anything convertible into [`BeforeSend`],
    /// which includes `Option<Event>` for the common synchronous
    /// pass/modify/veto cases.
    pub fn set_before_send<F, B>(&mut self, before_send: F) -> &mut Self
    where
        F: Fn(Event) -> B + Send + Sync + 'static,
        B: Into<BeforeSend>,
    {
        self.before_send = Some(Arc::new(move |event| before_send(event).into()));
        self
    }

    /// Set an explicit transport to deliver through.
    pub fn set_transport<T: Transport>(&mut self, transport: T) -> &mut Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Whether an explicit [`Transport`] has been set on these options.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct BeforeSend;
        let before_send = self.before_send.as_ref().map(|_| BeforeSend);
        #[derive(Debug)]
        struct Transport;
        let transport = self.transport.as_ref().map(|_| Transport);
        #[derive(Debug)]
        struct TransportFactory;
        let transport_factory = self.transport_factory.as_ref().map(|_| TransportFactory);
        let auth_token = self.auth_token.as_ref().map(|_| "***");

        f.debug_struct("ClientOptions")
            .field("dsn", &self.dsn)
            .field("auth_token", &auth_token)
            .field("debug", &self.debug)
            .field("environment", &self.environment)
            .field("release", &self.release)
            .field("server_name", &self.server_name)
            .field("sample_rate", &self.sample_rate)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .field("before_send", &before_send)
            .field("transport", &transport)
            .field("transport_factory", &transport_factory)
            .field("user_agent", &self.user_agent)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            dsn: None,
            auth_token: None,
            debug: false,
            environment: None,
            release: None,
            server_name: None,
            sample_rate: 1.0,
            max_breadcrumbs: 100,
            before_send: None,
            transport: None,
            transport_factory: None,
            user_agent: Cow::Borrowed(&USER_AGENT),
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl<T: IntoDsn> From<(T, ClientOptions)> for ClientOptions {
    fn from((into_dsn, mut opts): (T, ClientOptions)) -> ClientOptions {
        opts.dsn = into_dsn.into_dsn().expect("invalid value for DSN");
        opts
    }
}

impl<T: IntoDsn> From<T> for ClientOptions {
    fn from(into_dsn: T) -> ClientOptions {
        ClientOptions {
            dsn: into_dsn.into_dsn().expect("invalid value for DSN"),
            ..ClientOptions::default()
        }
    }
}
