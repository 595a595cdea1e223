use crate::converters::EventData;
use crate::notice::Cause;
use crate::notifier::{AirbrakeNotifier, Notifier};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, Layer};

/// Frames of reporting machinery between the log call site and the point
/// where the backtrace is captured.
const FRAME_SKIP: usize = 3;

/// A [`Layer`] that reports error events to Airbrake.
///
/// Only events at [`Level::ERROR`] are reported; `tracing` has no severities
/// above it, so this single level covers what other frameworks split into
/// error, fatal and panic. Reporting is best effort: delivery failures are
/// written to stderr and never propagated to the code that logged.
pub struct AirbrakeLayer<N = AirbrakeNotifier> {
    notifier: N,
    environment: String,
}

impl AirbrakeLayer<AirbrakeNotifier> {
    /// Creates a layer reporting to the default Airbrake endpoint.
    pub fn new(
        project_id: i64,
        api_key: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self::from_notifier(AirbrakeNotifier::new(project_id, api_key), environment)
    }

    /// Creates a layer reporting to a self-hosted endpoint.
    pub fn with_host(
        project_id: i64,
        api_key: impl Into<String>,
        environment: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        let mut notifier = AirbrakeNotifier::new(project_id, api_key);
        notifier.set_host(host.into());
        Self::from_notifier(notifier, environment)
    }
}

impl<N: Notifier> AirbrakeLayer<N> {
    /// Wraps an externally constructed notifier. A filter is registered on it
    /// that suppresses every notice when `environment` is `"development"`,
    /// and stamps the notice context with the environment label otherwise.
    pub fn from_notifier(mut notifier: N, environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let env = environment.clone();
        notifier.add_filter(Box::new(move |mut notice| {
            if env == "development" {
                return None;
            }
            notice
                .context
                .insert("environment".to_owned(), env.clone());
            Some(notice)
        }));
        Self {
            notifier,
            environment,
        }
    }

    /// The environment label this layer was constructed with.
    pub fn environment(&self) -> &str {
        &self.environment
    }
}

impl<S: Subscriber, N: Notifier + 'static> Layer<S> for AirbrakeLayer<N> {
    fn on_event(&self, event: &Event<'_>, _context: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let EventData {
            message,
            error,
            request,
            fields,
        } = EventData::from_event(event);

        // An error value recorded under the `error` field is the cause;
        // otherwise one is synthesized from the message text.
        let cause = Cause::new(event.metadata().target(), error.unwrap_or(message));

        let mut notice = self.notifier.notice(&cause, request.as_ref(), FRAME_SKIP);
        notice.context.extend(fields);

        if let Err(error) = self.notifier.send_notice(notice) {
            eprintln!("Failed to send notice to Airbrake: {error}");
        }
    }
}
