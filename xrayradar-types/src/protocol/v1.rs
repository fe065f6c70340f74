//! The current latest xrayradar protocol version.
//!
//! These payloads are what the SDK serializes and POSTs to the collector's
//! store endpoint.  Types here are plain data: builders and policy live in
//! the core crate.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::ts_rfc3339;

/// An arbitrary JSON value.
pub use serde_json::Value;

/// The type of a JSON map used by the protocol.
pub type Map<K, V> = std::collections::BTreeMap<K, V>;

/// An error used when parsing `Level`.
#[derive(Debug, Error)]
#[error("invalid level")]
pub struct ParseLevelError;

/// Represents the level of severity of an event or breadcrumb.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Indicates very spammy debug information.
    Debug,
    /// Informational messages.
    Info,
    /// A warning.
    Warning,
    /// An error.
    Error,
    /// Similar to error but indicates a critical event that usually causes a shutdown.
    Fatal,
}

impl Default for Level {
    fn default() -> Level {
        Level::Error
    }
}

impl str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(string: &str) -> Result<Level, Self::Err> {
        Ok(match string {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warning" => Level::Warning,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            _ => return Err(ParseLevelError),
        })
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Level::Debug => write!(f, "debug"),
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
            Level::Fatal => write!(f, "fatal"),
        }
    }
}

impl Level {
    /// A quick way to check if the level is `error`.
    pub fn is_error(&self) -> bool {
        *self == Level::Error
    }
}

impl_str_serde!(Level, "a severity level");

mod breadcrumb {
    pub fn default_type() -> String {
        "default".to_string()
    }

    pub fn is_default_type(ty: &str) -> bool {
        ty == "default"
    }
}

/// Represents a single breadcrumb.
///
/// The `ty` tag comes from a closed set understood by the collector:
/// `default`, `http`, `navigation`, `ui`, `console`, `error`, `query`,
/// `user`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    /// The timestamp of the breadcrumb.  This is required.
    #[serde(default = "SystemTime::now", with = "ts_rfc3339")]
    pub timestamp: SystemTime,
    /// The type of the breadcrumb.
    #[serde(
        rename = "type",
        default = "breadcrumb::default_type",
        skip_serializing_if = "breadcrumb::is_default_type"
    )]
    pub ty: String,
    /// The optional category of the breadcrumb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// The optional level of the breadcrumb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// A human readable message for the breadcrumb.
    pub message: String,
    /// Arbitrary breadcrumb data that should be sent along.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Default for Breadcrumb {
    fn default() -> Breadcrumb {
        Breadcrumb {
            timestamp: SystemTime::now(),
            ty: breadcrumb::default_type(),
            category: Default::default(),
            level: Default::default(),
            message: Default::default(),
            data: Default::default(),
        }
    }
}

/// Represents user info.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// A human readable username of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The email address of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The remote ip address of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Additional arbitrary fields for forwards compatibility.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Represents http request data.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Request {
    /// The current URL of the request.  May be relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The HTTP request method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Optionally the encoded query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    /// Optionally some associated request data (human readable).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// HTTP request headers.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub headers: Map<String, String>,
    /// Optionally a CGI/WSGI etc. environment dictionary.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub env: Map<String, String>,
}

/// The ambient context attached to an event.
///
/// These are the fixed semantic slots the collector understands: the
/// user, the request, string tags, free-form extra values and the
/// environment/release/server identification scalars.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Contexts {
    /// The user that was active when the event happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// The request that was being handled when the event happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    /// String tags, keys unique.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub tags: Map<String, String>,
    /// Arbitrary structured extra values.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
    /// The environment the event was recorded in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// The release the event was recorded against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// The reporting server or device name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

impl Contexts {
    /// True if no slot carries any data.
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.request.is_none()
            && self.tags.is_empty()
            && self.extra.is_empty()
            && self.environment.is_none()
            && self.release.is_none()
            && self.server_name.is_none()
    }
}

mod frame {
    pub fn unknown_function() -> String {
        "?".to_string()
    }
}

/// Represents a frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    /// The filename the frame points into.
    pub filename: String,
    /// The name of the function, or `"?"` when unrecoverable.
    #[serde(default = "frame::unknown_function")]
    pub function: String,
    /// The line number.
    pub lineno: u64,
    /// The column number if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u64>,
    /// If known the absolute path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    /// Whether the frame points into application code rather than
    /// third-party or runtime-internal code.
    #[serde(default)]
    pub in_app: bool,
}

impl Default for Frame {
    fn default() -> Frame {
        Frame {
            filename: Default::default(),
            function: frame::unknown_function(),
            lineno: 0,
            colno: None,
            abs_path: None,
            in_app: false,
        }
    }
}

/// Represents a stacktrace.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Stacktrace {
    /// The list of frames in the stacktrace.
    #[serde(default)]
    pub frames: Vec<Frame>,
}

/// Represents a single exception.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Exception {
    /// The type of the exception.
    #[serde(rename = "type")]
    pub ty: String,
    /// The optional value of the exception.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// An optional module for this exception.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Optionally the stacktrace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
}

/// Represents a list of values wrapped in the `{"values": [...]}` envelope
/// the collector expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Values<T> {
    /// The values of the list.
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

impl<T> Default for Values<T> {
    fn default() -> Values<T> {
        Values { values: Vec::new() }
    }
}

impl<T> Values<T> {
    /// Creates an empty list.
    pub fn new() -> Values<T> {
        Values::default()
    }

    /// Checks whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> From<Vec<T>> for Values<T> {
    fn from(values: Vec<T>) -> Values<T> {
        Values { values }
    }
}

impl<T> Deref for Values<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<T> DerefMut for Values<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}

/// Holds information about the SDK that produced an event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientSdkInfo {
    /// The name of the SDK.
    pub name: String,
    /// The version of the SDK.
    pub version: String,
}

mod event {
    use super::*;

    pub fn default_id() -> Uuid {
        crate::random_uuid()
    }

    pub fn default_platform() -> Cow<'static, str> {
        Cow::Borrowed("native")
    }

    pub fn is_default_platform(platform: &str) -> bool {
        platform == "native"
    }
}

/// Represents a full event for the collector.
///
/// Once built the payload is treated as read-only; the SDK never mutates an
/// event after it has been handed to a transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    /// The ID of the event.
    #[serde(default = "event::default_id")]
    pub event_id: Uuid,
    /// The timestamp of when the event was created.
    #[serde(default = "SystemTime::now", with = "ts_rfc3339")]
    pub timestamp: SystemTime,
    /// The level of the event (defaults to error).
    #[serde(default)]
    pub level: Level,
    /// A message to be sent with the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// A platform identifier for this event.
    #[serde(
        default = "event::default_platform",
        skip_serializing_if = "event::is_default_platform"
    )]
    pub platform: Cow<'static, str>,
    /// SDK metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<ClientSdkInfo>,
    /// The ambient context snapshot taken at build time.
    #[serde(default, skip_serializing_if = "Contexts::is_empty")]
    pub contexts: Contexts,
    /// Breadcrumbs to send along, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,
    /// The grouping fingerprint for the collector.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprint: Vec<String>,
    /// Exceptions to be attached.
    #[serde(default, skip_serializing_if = "Values::is_empty")]
    pub exception: Values<Exception>,
    /// Optionally a name to version mapping of installed modules.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub modules: Map<String, String>,
}

impl Default for Event {
    fn default() -> Self {
        Event {
            event_id: event::default_id(),
            timestamp: SystemTime::now(),
            level: Level::default(),
            message: Default::default(),
            platform: event::default_platform(),
            sdk: Default::default(),
            contexts: Default::default(),
            breadcrumbs: Default::default(),
            fingerprint: Default::default(),
            exception: Default::default(),
            modules: Default::default(),
        }
    }
}

impl Event {
    /// Creates a new event with the current timestamp and random id.
    pub fn new() -> Event {
        Default::default()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Event(id: {}, ts: {})",
            self.event_id,
            crate::utils::to_rfc3339(&self.timestamp)
        )
    }
}
