//! User-facing notifications.
//!
//! The applet store reports loading progress through the [`AlertSink`]
//! trait. [`AlertStore`] is the full implementation used by the UI;
//! [`LogAlerts`] writes to the log instead and is the fallback when no
//! store is supplied.

mod error;
mod sink;
mod store;
mod types;

pub use error::{AlertError, AlertResult};
pub use sink::{is_cancellation, AlertSink, LogAlerts};
pub use store::AlertStore;
pub use types::{
    Alert, AlertDraft, AlertId, AlertType, RouteLocation, RouteOptions, DEFAULT_TIMEOUT_MS,
};
