use indexmap::IndexMap;
use tracing::field::{Field, Visit};

const HTTP_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "CONNECT", "TRACE",
];

/// An in-flight HTTP request attached to an error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
}

impl RequestInfo {
    /// Parses a request-shaped string of the form `"METHOD url"`, where the
    /// method is a known HTTP verb and the url is absolute. Returns `None`
    /// for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        let (method, url) = value.split_once(' ')?;
        if !HTTP_METHODS.contains(&method) {
            return None;
        }
        let url = url.trim();
        if !url.contains("://") {
            return None;
        }
        Some(Self {
            method: method.to_owned(),
            url: url.to_owned(),
        })
    }
}

/// The data recorded on a single `tracing` event, reshaped for reporting.
#[derive(Debug, Default)]
pub struct EventData {
    /// The event's message text.
    pub message: String,
    /// Display form of an error value recorded under the `error` field, if
    /// one was recorded.
    pub error: Option<String>,
    /// The first request-shaped field value, detached from `fields`.
    pub request: Option<RequestInfo>,
    /// All remaining fields, stringified, in declaration order.
    pub fields: IndexMap<String, String>,
}

impl EventData {
    /// Collects the fields of `event`.
    pub fn from_event(event: &tracing::Event<'_>) -> Self {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        visitor.data
    }
}

#[derive(Default)]
struct FieldVisitor {
    data: EventData,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.data.message = strip_ansi(value);
            return;
        }
        if self.data.request.is_none() {
            if let Some(request) = RequestInfo::parse(value) {
                self.data.request = Some(request);
                return;
            }
        }
        self.data
            .fields
            .insert(field.name().to_owned(), strip_ansi(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let text = value.to_string();
        if field.name() == "error" {
            self.data.error = Some(text.clone());
        }
        // The cause field is not consumed destructively: it stays visible in
        // the copied context as its string form.
        self.data.fields.insert(field.name().to_owned(), text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = strip_ansi(&format!("{:?}", value));
        if field.name() == "message" {
            self.data.message = text;
            return;
        }
        self.data.fields.insert(field.name().to_owned(), text);
    }
}

fn strip_ansi(value: &str) -> String {
    strip_ansi_escapes::strip_str(value)
}
