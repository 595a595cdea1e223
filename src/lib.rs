//! Reports error events from the `tracing` crate to Airbrake.
//!
//! [`AirbrakeLayer`] is a `tracing_subscriber` layer that watches every event
//! at error level, converts it into an Airbrake notice and delivers it
//! synchronously through a [`Notifier`]. Delivery is fire and forget: a
//! failed send is written to stderr and the logging call never observes it.
//!
//! Fields recorded on the event become string entries in the notice context.
//! Two fields get special treatment: an error value recorded under `error`
//! becomes the reported cause, and the first string field shaped like
//! `"METHOD url"` is attached as the request instead of the context.
//!
//! Nothing is ever sent when the layer is constructed with the
//! `"development"` environment.
//!
//! # Examples
//!
//! ```no_run
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let layer = airbrake_tracing::AirbrakeLayer::new(113743, "81bbff95d52f8856c770bb39e827f3f6", "production");
//! tracing_subscriber::registry().with(layer).init();
//!
//! tracing::error!(user_id = 42, "failed to save user");
//! ```

#![warn(missing_docs)]

mod converters;
mod layer;
mod notice;
mod notifier;

pub use converters::{EventData, RequestInfo};
pub use layer::AirbrakeLayer;
pub use notice::{Cause, Notice, NoticeError, NotifierInfo, StackFrame};
pub use notifier::{
    AirbrakeNotifier, Notifier, NoticeFilter, NoticeId, NotifierError, DEFAULT_HOST,
};
