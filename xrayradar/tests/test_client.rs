use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use xrayradar::protocol::{Breadcrumb, Request};
use xrayradar::{
    BeforeSend, CaptureOptions, Client, ClientOptions, ContextUpdate, Event, ExceptionInfo, Level,
    Transport,
};
use xrayradar_core::test::TestTransport;

fn wait_for_events(transport: &TestTransport, deadline: Duration) -> Vec<Event> {
    let start = Instant::now();
    loop {
        let events = transport.fetch_and_clear_events();
        if !events.is_empty() || start.elapsed() > deadline {
            return events;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_disabled_client() {
    let client = Client::with_options(ClientOptions::default());
    assert!(!client.is_enabled());
    assert!(client
        .capture_exception(ExceptionInfo::new("Error", "x"), Default::default())
        .is_none());
    assert!(client.capture_message("x", Default::default()).is_none());
    client.set_tag("k", "v");
    client.add_breadcrumb(Breadcrumb {
        message: "b".into(),
        ..Default::default()
    });
    assert!(client.scope().contexts().tags.is_empty());
    assert!(client.scope().breadcrumbs().is_empty());
}

#[test]
fn test_before_send_veto() {
    let transport = TestTransport::new();
    let mut options = ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    };
    options.set_before_send(|_event: Event| None::<Event>);
    let client = Client::with_options(options);

    assert!(client.capture_message("dropped", Default::default()).is_none());
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[test]
fn test_before_send_modify() {
    let transport = TestTransport::new();
    let mut options = ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    };
    options.set_before_send(|mut event: Event| {
        event.message = Some("filtered".into());
        Some(event)
    });
    let client = Client::with_options(options);

    let event_id = client.capture_message("original", Default::default()).unwrap();
    let events = transport.fetch_and_clear_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message.as_deref(), Some("filtered"));
    assert_eq!(events[0].event_id, event_id);
}

#[test]
fn test_before_send_deferred() {
    let transport = TestTransport::new();
    let mut options = ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    };
    options.set_before_send(|event: Event| BeforeSend::Deferred(Box::new(move || Some(event))));
    let client = Client::with_options(options);

    // the caller cannot know the event id yet
    assert!(client.capture_message("deferred", Default::default()).is_none());
    let events = wait_for_events(&transport, Duration::from_secs(2));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message.as_deref(), Some("deferred"));
}

#[test]
fn test_before_send_deferred_veto() {
    let transport = TestTransport::new();
    let mut options = ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    };
    options.set_before_send(|_event: Event| BeforeSend::Deferred(Box::new(|| None)));
    let client = Client::with_options(options);

    assert!(client.capture_message("dropped", Default::default()).is_none());
    thread::sleep(Duration::from_millis(200));
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[test]
fn test_sample_rate_zero_drops_everything() {
    let transport = TestTransport::new();
    let client = Client::with_options(ClientOptions {
        transport: Some(transport.clone()),
        sample_rate: 0.0,
        ..Default::default()
    });
    for _ in 0..50 {
        assert!(client.capture_message("x", Default::default()).is_none());
    }
    assert!(transport.fetch_and_clear_events().is_empty());
}

#[test]
fn test_sample_rate_statistics() {
    let transport = TestTransport::new();
    let client = Client::with_options(ClientOptions {
        transport: Some(transport.clone()),
        sample_rate: 0.5,
        ..Default::default()
    });
    let hits = (0..100)
        .filter(|_| client.capture_message("x", Default::default()).is_some())
        .count();
    assert!(hits > 20 && hits < 80, "hits: {}", hits);
    assert_eq!(transport.fetch_and_clear_events().len(), hits);
}

#[test]
fn test_per_capture_context_override() {
    let transport = TestTransport::new();
    let client = Client::with_options(ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    });

    client.capture_exception(
        ExceptionInfo::new("Error", "boom"),
        CaptureOptions {
            context: Some(ContextUpdate {
                request: Some(Request {
                    url: Some("/x".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    let events = transport.fetch_and_clear_events();
    assert_eq!(
        events[0].contexts.request.as_ref().unwrap().url.as_deref(),
        Some("/x")
    );

    // the live scope stays untouched; a later capture has no request context
    assert!(client.scope().contexts().request.is_none());
    client.capture_message("second", Default::default());
    let events = transport.fetch_and_clear_events();
    assert!(events[0].contexts.request.is_none());
}

#[test]
fn test_per_capture_breadcrumbs() {
    let transport = TestTransport::new();
    let client = Client::with_options(ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    });
    client.add_breadcrumb(Breadcrumb {
        message: "persistent".into(),
        ..Default::default()
    });

    client.capture_message(
        "with extras",
        CaptureOptions {
            breadcrumbs: vec![Breadcrumb {
                message: "only this once".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    let events = transport.fetch_and_clear_events();
    let breadcrumbs = &events[0].breadcrumbs;
    assert_eq!(breadcrumbs.len(), 2);
    assert_eq!(breadcrumbs[0].message, "persistent");
    assert_eq!(breadcrumbs[1].message, "only this once");

    assert_eq!(client.scope().breadcrumbs().len(), 1);
}

struct RecordingTransport {
    flushed: AtomicBool,
    shut_down: AtomicBool,
}

impl Transport for RecordingTransport {
    fn send_event(&self, _event: Event) {}

    fn flush(&self, _timeout: Duration) -> bool {
        self.flushed.store(true, Ordering::SeqCst);
        true
    }

    fn shutdown(&self, _timeout: Duration) -> bool {
        self.shut_down.store(true, Ordering::SeqCst);
        true
    }
}

#[test]
fn test_flush_and_close_forward_to_transport() {
    let transport = Arc::new(RecordingTransport {
        flushed: AtomicBool::new(false),
        shut_down: AtomicBool::new(false),
    });
    let client = Client::with_options(ClientOptions {
        transport: Some(transport.clone()),
        ..Default::default()
    });

    assert!(client.flush(None));
    assert!(transport.flushed.load(Ordering::SeqCst));

    assert!(client.close(None));
    assert!(transport.shut_down.load(Ordering::SeqCst));

    // close is idempotent-safe; the transport slot stays empty afterwards
    assert!(client.close(None));
    assert!(client.flush(None));
}
