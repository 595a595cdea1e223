use indexmap::IndexMap;
use serde::Serialize;

use crate::converters::RequestInfo;

/// The cause of a [`Notice`]: an exception kind plus a human readable message.
///
/// The kind is conventionally the `tracing` target of the event that produced
/// the report, and the message is either the recorded `error` value or the
/// event's message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// Exception kind, reported as the error `type`.
    pub kind: String,
    /// Error message text.
    pub message: String,
}

impl Cause {
    /// Creates a new cause.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// An error report payload in the Airbrake v3 notice shape.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    /// The reported errors. Always exactly one when built by this crate.
    pub errors: Vec<NoticeError>,
    /// Free form string context shown alongside the report.
    pub context: IndexMap<String, String>,
    /// Metadata identifying the client that produced the notice.
    pub notifier: NotifierInfo,
}

impl Notice {
    /// Builds a notice for `cause`, capturing a backtrace that skips
    /// `frame_skip` frames of reporting machinery.
    pub fn new(cause: &Cause, frame_skip: usize) -> Self {
        Notice {
            errors: vec![NoticeError {
                ty: cause.kind.clone(),
                message: cause.message.clone(),
                backtrace: capture_backtrace(frame_skip),
            }],
            context: IndexMap::new(),
            notifier: NotifierInfo::default(),
        }
    }

    /// Attaches an in-flight HTTP request to the notice context.
    pub fn set_request(&mut self, request: &RequestInfo) {
        self.context.insert("url".to_owned(), request.url.clone());
        self.context
            .insert("httpMethod".to_owned(), request.method.clone());
    }
}

/// A single error within a [`Notice`].
#[derive(Debug, Clone, Serialize)]
pub struct NoticeError {
    /// Exception kind.
    #[serde(rename = "type")]
    pub ty: String,
    /// Error message text.
    pub message: String,
    /// Call stack at the point the notice was built.
    pub backtrace: Vec<StackFrame>,
}

/// One resolved frame of a notice backtrace.
#[derive(Debug, Clone, Serialize)]
pub struct StackFrame {
    /// Source file path, or `<unknown>` when symbols could not be resolved.
    pub file: String,
    /// Line number, `0` when unresolved.
    pub line: u32,
    /// Demangled function name.
    pub function: String,
}

/// Identifies this crate in the `notifier` section of every payload.
#[derive(Debug, Clone, Serialize)]
pub struct NotifierInfo {
    /// Client library name.
    pub name: &'static str,
    /// Client library version.
    pub version: &'static str,
    /// Client library homepage.
    pub url: &'static str,
}

impl Default for NotifierInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            url: env!("CARGO_PKG_REPOSITORY"),
        }
    }
}

fn capture_backtrace(frame_skip: usize) -> Vec<StackFrame> {
    let trace = backtrace::Backtrace::new();
    trace
        .frames()
        .iter()
        .skip(frame_skip)
        .flat_map(|frame| frame.symbols())
        .map(|symbol| StackFrame {
            file: symbol
                .filename()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_owned()),
            line: symbol.lineno().unwrap_or(0),
            function: symbol
                .name()
                .map(|name| name.to_string())
                .unwrap_or_else(|| "<unknown>".to_owned()),
        })
        .collect()
}
