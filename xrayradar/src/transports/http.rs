use std::time::Duration;

use ureq::{Agent, AgentBuilder};

use xrayradar_core::radar_debug;

use super::thread::TransportThread;
use crate::protocol::Event;
use crate::{ClientOptions, Transport};

// Payloads above this size get truncated before hitting the wire.
const MAX_PAYLOAD_BYTES: usize = 100 * 1024;
const MAX_MESSAGE_CHARS: usize = 1000;
const MAX_SENT_BREADCRUMBS: usize = 100;
const MAX_SENT_FRAMES: usize = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A [`Transport`] that sends events via the [`ureq`] library.
///
/// Events are delivered one POST per event to the collector's store
/// endpoint on a background worker thread.  Delivery failures of any kind
/// (rate limits, non-success statuses, network errors) are reported on the
/// diagnostic channel and never propagate back into application code.
///
/// This is enabled by the `transport` feature flag.
pub struct HttpTransport {
    thread: TransportThread,
}

impl HttpTransport {
    /// Creates a new Transport.
    pub fn new(options: &ClientOptions) -> Self {
        Self::new_internal(options, None)
    }

    /// Creates a new Transport that uses the specified [`ureq::Agent`].
    pub fn with_agent(options: &ClientOptions, agent: Agent) -> Self {
        Self::new_internal(options, Some(agent))
    }

    fn new_internal(options: &ClientOptions, agent: Option<Agent>) -> Self {
        let dsn = options
            .dsn
            .as_ref()
            .expect("HttpTransport requires a DSN on the options");
        let agent = agent
            .unwrap_or_else(|| AgentBuilder::new().timeout(REQUEST_TIMEOUT).build());
        let url = dsn.store_api_url();
        let user_agent = options.user_agent.to_string();
        let auth_token = options.auth_token.clone();

        let thread = TransportThread::new(move |mut event| {
            let mut body = match serde_json::to_string(&event) {
                Ok(body) => body,
                Err(err) => {
                    radar_debug!("[HttpTransport] failed to serialize event: {}", err);
                    return;
                }
            };
            if body.len() > MAX_PAYLOAD_BYTES {
                radar_debug!(
                    "[HttpTransport] payload is {} bytes, truncating",
                    body.len()
                );
                truncate_payload(&mut event);
                body = match serde_json::to_string(&event) {
                    Ok(body) => body,
                    Err(err) => {
                        radar_debug!("[HttpTransport] failed to serialize event: {}", err);
                        return;
                    }
                };
            }

            let event_id = event.event_id;
            let mut request = agent
                .post(&url)
                .set("Content-Type", "application/json")
                .set("User-Agent", &user_agent);
            if let Some(token) = auth_token.as_deref() {
                request = request.set("X-Xrayradar-Token", token);
            }

            match request.send_string(&body) {
                Ok(response) => {
                    radar_debug!(
                        "[HttpTransport] event {} accepted with status {}",
                        event_id,
                        response.status()
                    );
                }
                Err(ureq::Error::Status(429, response)) => {
                    let retry_after = response
                        .header("Retry-After")
                        .unwrap_or("60")
                        .to_string();
                    radar_debug!(
                        "[HttpTransport] rate limited by the collector, retry after {}s \
                         (event {} dropped)",
                        retry_after,
                        event_id
                    );
                }
                Err(ureq::Error::Status(status, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    let excerpt: String = body.chars().take(200).collect();
                    radar_debug!(
                        "[HttpTransport] event {} rejected: HTTP {} - {}",
                        event_id,
                        status,
                        excerpt
                    );
                }
                Err(err) => {
                    radar_debug!(
                        "[HttpTransport] failed to send event {}: {}",
                        event_id,
                        err
                    );
                }
            }
        });

        Self { thread }
    }
}

impl Transport for HttpTransport {
    fn send_event(&self, event: Event) {
        self.thread.send(event)
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.thread.flush(timeout)
    }

    fn shutdown(&self, timeout: Duration) -> bool {
        self.flush(timeout)
    }
}

/// Caps an oversized payload: the message at [`MAX_MESSAGE_CHARS`]
/// characters with a trailing ellipsis, breadcrumbs at the most recent
/// [`MAX_SENT_BREADCRUMBS`] and each exception's frames at the first
/// [`MAX_SENT_FRAMES`].
fn truncate_payload(event: &mut Event) {
    if let Some(message) = event.message.as_mut() {
        if message.chars().count() > MAX_MESSAGE_CHARS {
            let mut truncated: String = message.chars().take(MAX_MESSAGE_CHARS - 3).collect();
            truncated.push_str("...");
            *message = truncated;
        }
    }
    if event.breadcrumbs.len() > MAX_SENT_BREADCRUMBS {
        let excess = event.breadcrumbs.len() - MAX_SENT_BREADCRUMBS;
        event.breadcrumbs.drain(..excess);
    }
    for exception in event.exception.iter_mut() {
        if let Some(stacktrace) = exception.stacktrace.as_mut() {
            stacktrace.frames.truncate(MAX_SENT_FRAMES);
        }
    }
}
