//! Builders that turn exceptions and messages into event payloads, plus the
//! sampling and level-normalization policy.

use std::error::Error;

use lazy_static::lazy_static;
use rand::random;
use regex::Regex;

use crate::constants::SDK_INFO;
use crate::protocol::{Event, Exception, Frame, Level, Stacktrace};
use crate::scope::Scope;

lazy_static! {
    // "at <fn> (<file>:<line>:<col>)"
    static ref FRAME_WITH_FUNCTION_RE: Regex =
        Regex::new(r"^\s*at\s+(.+?)\s+\((.+?):(\d+):(\d+)\)\s*$").unwrap();
    // "at <file>:<line>:<col>"
    static ref FRAME_BARE_RE: Regex = Regex::new(r"^\s*at\s+(.+?):(\d+):(\d+)\s*$").unwrap();
}

/// The `function` value used when a frame's function name is unrecoverable.
pub const UNKNOWN_FUNCTION: &str = "?";

// Path segments that mark a frame as third-party rather than application
// code.
const THIRD_PARTY_PATH_MARKERS: &[&str] = &["/.cargo/registry/", "/.cargo/git/", "node_modules"];
const ANONYMOUS_MARKER: &str = "<anonymous>";
const INTERNAL_RUNTIME_MARKERS: &[&str] = &["/rustc/", "/.rustup/toolchains/"];

/// The error input for exception captures.
///
/// Carries the error's type name, its message text and optionally the raw
/// textual stack trace to be parsed into frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionInfo {
    /// The type (name/kind) of the error.
    pub ty: String,
    /// The error's message text.
    pub value: String,
    /// The raw stack trace, most recent call first.
    pub stack: Option<String>,
}

impl ExceptionInfo {
    /// Creates a new exception info from a type and a message.
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> ExceptionInfo {
        ExceptionInfo {
            ty: ty.into(),
            value: value.into(),
            stack: None,
        }
    }

    /// Attaches a raw stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> ExceptionInfo {
        self.stack = Some(stack.into());
        self
    }

    /// Creates an exception info from any `std::error::Error`.
    pub fn from_error<E: Error + ?Sized>(error: &E) -> ExceptionInfo {
        ExceptionInfo {
            ty: parse_type_from_debug(error),
            value: error.to_string(),
            stack: None,
        }
    }
}

/// Parse the type's name from `Debug` output.
///
/// # Examples
///
/// ```
/// use xrayradar_core::parse_type_from_debug;
///
/// let err = "NaN".parse::<usize>().unwrap_err();
/// assert_eq!(&parse_type_from_debug(&err), "ParseIntError");
/// ```
pub fn parse_type_from_debug<D: std::fmt::Debug + ?Sized>(d: &D) -> String {
    let dbg = format!("{:#?}", d);

    dbg.split(&[' ', '(', '{', '\r', '\n'][..])
        .next()
        .unwrap_or(&dbg)
        .trim()
        .to_owned()
}

fn is_in_app(filename: &str) -> bool {
    if THIRD_PARTY_PATH_MARKERS
        .iter()
        .any(|marker| filename.contains(marker))
    {
        return false;
    }
    if filename.contains(ANONYMOUS_MARKER) {
        return false;
    }
    if filename.starts_with("internal/")
        || INTERNAL_RUNTIME_MARKERS
            .iter()
            .any(|marker| filename.contains(marker))
    {
        return false;
    }
    true
}

/// Parses a raw textual stack trace into frames.
///
/// Two line shapes are recognized: `at <fn> (<file>:<line>:<col>)` and
/// `at <file>:<line>:<col>` (in which case the function is the
/// [`UNKNOWN_FUNCTION`] sentinel).  Lines matching neither shape are
/// silently skipped.  The returned frames are in the reverse of the raw
/// trace order, so the payload reads oldest call first.
pub fn parse_stack(stack: &str) -> Vec<Frame> {
    let mut frames = Vec::new();

    for line in stack.lines() {
        let (function, filename, lineno, colno) =
            if let Some(captures) = FRAME_WITH_FUNCTION_RE.captures(line) {
                (
                    captures[1].trim().to_string(),
                    captures[2].to_string(),
                    captures[3].parse::<u64>().unwrap_or(0),
                    captures[4].parse::<u64>().ok(),
                )
            } else if let Some(captures) = FRAME_BARE_RE.captures(line) {
                (
                    UNKNOWN_FUNCTION.to_string(),
                    captures[1].to_string(),
                    captures[2].parse::<u64>().unwrap_or(0),
                    captures[3].parse::<u64>().ok(),
                )
            } else {
                continue;
            };

        // column 0 means the runtime did not know the column
        let colno = colno.filter(|colno| *colno != 0);
        let in_app = is_in_app(&filename);
        frames.push(Frame {
            abs_path: Some(filename.clone()),
            filename,
            function,
            lineno,
            colno,
            in_app,
        });
    }

    frames.reverse();
    frames
}

/// Builds an event payload from an exception.
///
/// The event carries exactly one exception entry.  When no explicit
/// `message` is supplied it defaults to `"<type>: <value>"`.  The
/// fingerprint is the error type, the error message and the first payload
/// frame's function, with empty entries filtered out; it is a grouping
/// heuristic for the collector, not a uniqueness guarantee.
pub fn event_from_exception(
    error: ExceptionInfo,
    level: Level,
    message: Option<String>,
    scope: Option<&Scope>,
) -> Event {
    let frames = error.stack.as_deref().map(parse_stack).unwrap_or_default();

    let fingerprint = [
        Some(error.ty.as_str()),
        Some(error.value.as_str()),
        frames.first().map(|frame| frame.function.as_str()),
    ]
    .iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .map(|part| part.to_string())
    .collect();

    let message = message.unwrap_or_else(|| format!("{}: {}", error.ty, error.value));
    let exception = Exception {
        ty: error.ty,
        value: Some(error.value),
        module: None,
        stacktrace: Some(Stacktrace { frames }),
    };

    Event {
        level,
        message: Some(message),
        sdk: Some(SDK_INFO.clone()),
        contexts: scope.map(Scope::contexts).unwrap_or_default(),
        breadcrumbs: scope.map(Scope::breadcrumbs).unwrap_or_default(),
        fingerprint,
        exception: vec![exception].into(),
        ..Default::default()
    }
}

/// Builds an event payload from a plain message.
///
/// The fingerprint is the message verbatim; no normalization is applied, so
/// messages differing only in case or whitespace group separately (grouping
/// beyond that is the collector's call).
pub fn event_from_message(message: &str, level: Level, scope: Option<&Scope>) -> Event {
    Event {
        level,
        message: Some(message.to_string()),
        sdk: Some(SDK_INFO.clone()),
        contexts: scope.map(Scope::contexts).unwrap_or_default(),
        breadcrumbs: scope.map(Scope::breadcrumbs).unwrap_or_default(),
        fingerprint: vec![message.to_string()],
        ..Default::default()
    }
}

/// Normalizes a level string, case-insensitively.
///
/// Unrecognized values map to [`Level::Error`]; this never fails.
pub fn normalize_level(level: &str) -> Level {
    level
        .to_ascii_lowercase()
        .parse()
        .unwrap_or(Level::Error)
}

/// Returns a random boolean with a probability defined by rate.
///
/// A rate of 1 or above is always true, 0 or below always false.  Decisions
/// are independent across calls.
pub fn should_sample(rate: f32) -> bool {
    if rate >= 1.0 {
        true
    } else if rate <= 0.0 {
        false
    } else {
        random::<f32>() < rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Value;

    const STACK: &str = "Error: boom\n\
                         \x20   at handler (/srv/app/src/routes.ts:42:13)\n\
                         \x20   at /srv/app/src/server.ts:10:5\n\
                         some unparseable noise\n\
                         \x20   at run (/srv/app/node_modules/express/lib/router.js:7:3)";

    #[test]
    fn test_parse_stack_shapes_and_order() {
        let frames = parse_stack(STACK);
        assert_eq!(frames.len(), 3);

        // reversed: the deepest raw frame comes first in the payload
        assert_eq!(frames[0].function, "run");
        assert!(!frames[0].in_app);

        assert_eq!(frames[1].function, "?");
        assert_eq!(frames[1].filename, "/srv/app/src/server.ts");
        assert_eq!(frames[1].lineno, 10);
        assert_eq!(frames[1].colno, Some(5));
        assert!(frames[1].in_app);

        assert_eq!(frames[2].function, "handler");
        assert_eq!(frames[2].filename, "/srv/app/src/routes.ts");
        assert_eq!(frames[2].lineno, 42);
        assert_eq!(frames[2].colno, Some(13));
    }

    #[test]
    fn test_parse_stack_bare_line() {
        let frames = parse_stack("at /a/foo.ts:10:5");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function, "?");
        assert_eq!(frames[0].filename, "/a/foo.ts");
        assert_eq!(frames[0].lineno, 10);
        assert_eq!(frames[0].colno, Some(5));
    }

    #[test]
    fn test_parse_stack_skips_garbage() {
        assert!(parse_stack("nothing to see here\nor here").is_empty());
    }

    #[test]
    fn test_in_app_markers() {
        let stack = "\
            at a (/home/u/.cargo/registry/src/foo-1.0.0/src/lib.rs:1:1)\n\
            at b (/rustc/abc123/library/std/src/panicking.rs:5:5)\n\
            at c (<anonymous>:1:1)\n\
            at d (internal/process/task_queues.js:2:2)\n\
            at e (/srv/app/src/main.rs:3:3)";
        let frames = parse_stack(stack);
        let by_function = |function: &str| {
            frames
                .iter()
                .find(|frame| frame.function == function)
                .unwrap()
        };
        assert!(!by_function("a").in_app);
        assert!(!by_function("b").in_app);
        assert!(!by_function("c").in_app);
        assert!(!by_function("d").in_app);
        assert!(by_function("e").in_app);
    }

    #[test]
    fn test_event_from_exception() {
        let error = ExceptionInfo::new("TypeError", "x is not a function").with_stack(STACK);
        let event = event_from_exception(error, Level::Error, None, None);

        assert_eq!(event.exception.len(), 1);
        let exception = &event.exception[0];
        assert_eq!(exception.ty, "TypeError");
        assert_eq!(exception.value.as_deref(), Some("x is not a function"));
        assert_eq!(exception.stacktrace.as_ref().unwrap().frames.len(), 3);

        assert_eq!(
            event.message.as_deref(),
            Some("TypeError: x is not a function")
        );
        assert_eq!(
            event.fingerprint,
            vec!["TypeError", "x is not a function", "run"]
        );
        assert_eq!(event.sdk.as_ref().unwrap().name, "xrayradar.rust");
    }

    #[test]
    fn test_event_from_exception_message_override() {
        let error = ExceptionInfo::new("Error", "boom");
        let event = event_from_exception(error, Level::Warning, Some("custom".into()), None);
        assert_eq!(event.message.as_deref(), Some("custom"));
        assert_eq!(event.level, Level::Warning);
        // no stack: fingerprint falls back to type and message only
        assert_eq!(event.fingerprint, vec!["Error", "boom"]);
    }

    #[test]
    fn test_event_from_exception_pulls_scope() {
        let mut scope = Scope::new();
        scope.set_tag("env", "prod");
        scope.set_extra("attempt", Value::from(2));
        scope.add_breadcrumb(crate::protocol::Breadcrumb {
            message: "clicked".into(),
            ..Default::default()
        });

        let event = event_from_exception(
            ExceptionInfo::new("Error", "boom"),
            Level::Error,
            None,
            Some(&scope),
        );
        assert_eq!(event.contexts.tags["env"], "prod");
        assert_eq!(event.breadcrumbs.len(), 1);
        assert_eq!(event.breadcrumbs[0].message, "clicked");
    }

    #[test]
    fn test_event_from_message() {
        let event = event_from_message("Hello World!", Level::Info, None);
        assert_eq!(event.message.as_deref(), Some("Hello World!"));
        assert_eq!(event.fingerprint, vec!["Hello World!"]);
        assert!(event.exception.is_empty());
        assert_eq!(event.level, Level::Info);
    }

    #[test]
    fn test_exception_info_from_error() {
        let err = "NaN".parse::<usize>().unwrap_err();
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.ty, "ParseIntError");
        assert_eq!(info.value, err.to_string());
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("ERROR"), Level::Error);
        assert_eq!(normalize_level("Warning"), Level::Warning);
        assert_eq!(normalize_level("debug"), Level::Debug);
        assert_eq!(normalize_level("bogus"), Level::Error);
    }

    #[test]
    fn test_should_sample_bounds() {
        for _ in 0..100 {
            assert!(should_sample(1.0));
            assert!(should_sample(1.5));
            assert!(!should_sample(0.0));
            assert!(!should_sample(-0.5));
        }
    }

    #[test]
    fn test_should_sample_is_probabilistic() {
        let hits = (0..1000).filter(|_| should_sample(0.5)).count();
        // wide statistical tolerance, this must not flake
        assert!(hits > 300 && hits < 700, "hits: {}", hits);
    }
}
