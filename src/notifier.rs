use serde::Deserialize;
use thiserror::Error;

use crate::converters::RequestInfo;
use crate::notice::{Cause, Notice};

/// Default endpoint notices are delivered to.
pub const DEFAULT_HOST: &str = "https://api.airbrake.io";

/// A transformation run on every notice before transmission. Returning `None`
/// suppresses the notice entirely.
pub type NoticeFilter = Box<dyn Fn(Notice) -> Option<Notice> + Send + Sync>;

/// A delivery failure reported by [`Notifier::send_notice`].
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The notice never reached the service.
    #[error("failed to deliver notice: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service refused the notice.
    #[error("notice rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code of the refusal.
        status: u16,
        /// Response body, when one could be read.
        body: String,
    },
}

/// The service's acknowledgement of a delivered notice.
#[derive(Debug, Clone, Deserialize)]
pub struct NoticeId {
    /// Identifier assigned to the report.
    pub id: String,
    /// Link to the report, when the service provides one.
    #[serde(default)]
    pub url: Option<String>,
}

/// A client able to build and transmit [`Notice`]s.
///
/// [`AirbrakeNotifier`] is the production implementation; tests substitute a
/// recording one. Filter registration and host overrides happen during
/// construction, before the notifier is handed to a layer, hence the
/// `&mut self` receivers.
pub trait Notifier: Send + Sync {
    /// Builds a notice for `cause`, attaching `request` when present. The
    /// captured backtrace skips `frame_skip` frames of reporting machinery.
    fn notice(&self, cause: &Cause, request: Option<&RequestInfo>, frame_skip: usize) -> Notice {
        let mut notice = Notice::new(cause, frame_skip);
        if let Some(request) = request {
            notice.set_request(request);
        }
        notice
    }

    /// Runs the filter chain and transmits the notice. `Ok(None)` means a
    /// filter suppressed it and nothing was sent.
    fn send_notice(&self, notice: Notice) -> Result<Option<NoticeId>, NotifierError>;

    /// Appends a filter to the chain. Filters run in registration order.
    fn add_filter(&mut self, filter: NoticeFilter);

    /// Overrides the service endpoint.
    fn set_host(&mut self, host: String);
}

/// Synchronous Airbrake client: one POST per notice, no retries, no batching.
pub struct AirbrakeNotifier {
    project_id: i64,
    api_key: String,
    host: String,
    filters: Vec<NoticeFilter>,
    http: reqwest::blocking::Client,
}

impl AirbrakeNotifier {
    /// Creates a notifier for the given project credentials. Credential
    /// validity is not checked locally.
    pub fn new(project_id: i64, api_key: impl Into<String>) -> Self {
        Self {
            project_id,
            api_key: api_key.into(),
            host: DEFAULT_HOST.to_owned(),
            filters: Vec::new(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn run_filters(&self, mut notice: Notice) -> Option<Notice> {
        for filter in &self.filters {
            notice = filter(notice)?;
        }
        Some(notice)
    }
}

impl Notifier for AirbrakeNotifier {
    fn send_notice(&self, notice: Notice) -> Result<Option<NoticeId>, NotifierError> {
        let notice = match self.run_filters(notice) {
            Some(notice) => notice,
            None => return Ok(None),
        };

        let url = format!("{}/api/v3/projects/{}/notices", self.host, self.project_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&notice)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(Some(response.json()?))
    }

    fn add_filter(&mut self, filter: NoticeFilter) {
        self.filters.push(filter);
    }

    fn set_host(&mut self, host: String) {
        self.host = host.trim_end_matches('/').to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_host_trims_trailing_slash() {
        let mut notifier = AirbrakeNotifier::new(1, "key");
        notifier.set_host("https://errors.internal.example/".to_owned());
        assert_eq!(notifier.host, "https://errors.internal.example");
    }

    #[test]
    fn suppressing_filter_short_circuits_delivery() {
        // The host is unroutable on purpose: a suppressed notice must return
        // before any I/O happens.
        let mut notifier = AirbrakeNotifier::new(1, "key");
        notifier.set_host("http://127.0.0.1:0".to_owned());
        notifier.add_filter(Box::new(|_notice| None));

        let notice = notifier.notice(&Cause::new("app", "boom"), None, 0);
        let sent = notifier.send_notice(notice).unwrap();
        assert!(sent.is_none());
    }

    #[test]
    fn filters_run_in_registration_order() {
        let mut notifier = AirbrakeNotifier::new(1, "key");
        notifier.add_filter(Box::new(|mut notice| {
            notice.context.insert("a".to_owned(), "1".to_owned());
            Some(notice)
        }));
        notifier.add_filter(Box::new(|notice| {
            assert_eq!(notice.context.get("a").map(String::as_str), Some("1"));
            None
        }));

        let notice = notifier.notice(&Cause::new("app", "boom"), None, 0);
        assert!(notifier.send_notice(notice).unwrap().is_none());
    }
}
