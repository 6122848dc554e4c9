//! The alert callbacks the applet store reports through.

use std::error::Error;

use crate::error::Cancelled;

use super::types::{Alert, AlertId};

/// Receiver for applet loading progress.
///
/// Implemented by [`AlertStore`](super::AlertStore) for UI notifications and
/// by [`LogAlerts`] when no store is available.
pub trait AlertSink: Send + Sync {
    fn add_info_alert(&self, message: &str) -> Option<Alert>;

    fn add_success_alert(&self, message: &str) -> Option<Alert>;

    fn add_error_alert(&self, message: &str, error: Option<&(dyn Error + 'static)>)
        -> Option<Alert>;

    fn remove_alert_by_id(&self, id: AlertId) -> Option<Alert>;
}

/// Alert sink that only writes to the log.
///
/// Never creates alerts, so nothing is ever removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerts;

impl AlertSink for LogAlerts {
    fn add_info_alert(&self, message: &str) -> Option<Alert> {
        tracing::info!("{}", message);
        None
    }

    fn add_success_alert(&self, message: &str) -> Option<Alert> {
        tracing::info!("{}", message);
        None
    }

    fn add_error_alert(
        &self,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<Alert> {
        match error {
            Some(error) => tracing::error!(error = %error, "{}", message),
            None => tracing::error!("{}", message),
        }
        None
    }

    fn remove_alert_by_id(&self, _id: AlertId) -> Option<Alert> {
        None
    }
}

/// Whether `error` or anything in its source chain is a [`Cancelled`] marker.
pub fn is_cancellation(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.is::<Cancelled>() {
            return true;
        }
        current = err.source();
    }
    false
}
