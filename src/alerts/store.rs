//! In-memory list of dismissible, auto-expiring alerts.

use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::error::AlertResult;
use super::sink::{is_cancellation, AlertSink};
use super::types::{Alert, AlertDraft, AlertId, AlertType, RouteOptions, DEFAULT_TIMEOUT_MS};

/// Icon shown on error alerts.
const ERROR_ICON: &str = "mdi-cancel";

struct StoredAlert {
    alert: Alert,
    /// Pending auto-dismiss task.
    timer: Option<JoinHandle<()>>,
}

struct AlertState {
    alerts: Vec<StoredAlert>,
    next_id: AlertId,
}

impl AlertState {
    fn take(&mut self, id: AlertId) -> Option<StoredAlert> {
        let pos = self.alerts.iter().position(|stored| stored.alert.id == id)?;
        Some(self.alerts.remove(pos))
    }
}

/// Alert store handle.
///
/// Clones share the same alerts. Alerts with a timeout are removed by a
/// tokio task after the timeout elapses; when no runtime is running the
/// alert stays until removed by hand.
#[derive(Clone)]
pub struct AlertStore {
    inner: Arc<Mutex<AlertState>>,
    default_timeout: u64,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlertStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertStore")
            .field("alerts", &self.alerts())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl AlertStore {
    pub fn new() -> Self {
        Self::with_default_timeout(DEFAULT_TIMEOUT_MS)
    }

    /// Create a store whose alerts default to `timeout_ms` before dismissal.
    pub fn with_default_timeout(timeout_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AlertState {
                alerts: Vec::new(),
                next_id: 1,
            })),
            default_timeout: timeout_ms,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AlertState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current alerts, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts.iter().map(|s| s.alert.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    /// Create an alert from a partial description.
    ///
    /// Success alerts that link to a specific record stay up twice as long.
    pub fn add_alert(
        &self,
        draft: AlertDraft,
        route_options: Option<RouteOptions>,
    ) -> AlertResult<Alert> {
        let kind = draft.kind()?.unwrap_or_default();
        Ok(self.insert(|id, default_timeout| draft.build(kind, id, default_timeout, route_options)))
    }

    pub fn add_info_alert(&self, message: &str) -> Alert {
        self.insert_typed(AlertDraft::new(AlertType::Info, message), AlertType::Info, None)
    }

    pub fn add_success_alert(&self, message: &str, route_options: Option<RouteOptions>) -> Alert {
        self.insert_typed(
            AlertDraft::new(AlertType::Success, message),
            AlertType::Success,
            route_options,
        )
    }

    /// Create a warning alert, logging `error` if given.
    ///
    /// Returns `None` without creating anything when the error is a
    /// cancellation.
    pub fn add_warning_alert(
        &self,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<Alert> {
        if error.is_some_and(is_cancellation) {
            return None;
        }
        if let Some(error) = error {
            tracing::warn!(error = %error, "{}", message);
        }
        Some(self.insert_typed(AlertDraft::new(AlertType::Warning, message), AlertType::Warning, None))
    }

    /// Create an error alert that never expires, logging `error` if given.
    ///
    /// Returns `None` without creating anything when the error is a
    /// cancellation.
    pub fn add_error_alert(
        &self,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<Alert> {
        if error.is_some_and(is_cancellation) {
            return None;
        }
        if let Some(error) = error {
            tracing::error!(error = %error, "{}", message);
        }
        let draft = AlertDraft::new(AlertType::Error, message)
            .timeout(0)
            .icon(ERROR_ICON);
        Some(self.insert_typed(draft, AlertType::Error, None))
    }

    pub fn get_alert_by_id(&self, id: AlertId) -> Option<Alert> {
        self.lock()
            .alerts
            .iter()
            .find(|stored| stored.alert.id == id)
            .map(|stored| stored.alert.clone())
    }

    /// Patch the alert with `id`, or create it with that id if missing.
    pub fn update_alert(&self, id: AlertId, draft: AlertDraft) -> AlertResult<Alert> {
        {
            let mut state = self.lock();
            if let Some(stored) = state.alerts.iter_mut().find(|s| s.alert.id == id) {
                draft.patch(&mut stored.alert)?;
                return Ok(stored.alert.clone());
            }
        }

        let kind = draft.kind()?.unwrap_or_default();
        let alert = draft.build(kind, id, self.default_timeout, None);
        Ok(self.store(alert, true))
    }

    /// Remove an alert and cancel its pending dismissal.
    pub fn remove_alert_by_id(&self, id: AlertId) -> Option<Alert> {
        let stored = self.lock().take(id)?;
        if let Some(timer) = stored.timer {
            timer.abort();
        }
        Some(stored.alert)
    }

    /// Remove every alert and cancel all pending dismissals.
    pub fn clear_alerts(&self) {
        let drained: Vec<StoredAlert> = self.lock().alerts.drain(..).collect();
        for stored in drained {
            if let Some(timer) = stored.timer {
                timer.abort();
            }
        }
    }

    fn insert_typed(
        &self,
        draft: AlertDraft,
        kind: AlertType,
        route_options: Option<RouteOptions>,
    ) -> Alert {
        self.insert(|id, default_timeout| draft.build(kind, id, default_timeout, route_options))
    }

    fn insert(&self, make: impl FnOnce(AlertId, u64) -> Alert) -> Alert {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            id
        };

        let mut alert = make(id, self.default_timeout);
        if alert.kind == AlertType::Success
            && alert
                .route_options
                .as_ref()
                .is_some_and(RouteOptions::targets_record)
        {
            alert.timeout = alert.timeout.saturating_mul(2);
        }

        self.store(alert, false)
    }

    /// Insert `alert` and start its timer under one lock, so the timer
    /// always finds the alert it removes.
    fn store(&self, alert: Alert, bump_ids: bool) -> Alert {
        let mut state = self.lock();
        if bump_ids && alert.id >= state.next_id {
            state.next_id = alert.id.saturating_add(1);
        }
        let timer = alert
            .timeout_duration()
            .and_then(|after| self.schedule_removal(alert.id, after));
        state.alerts.push(StoredAlert {
            alert: alert.clone(),
            timer,
        });
        alert
    }

    fn schedule_removal(&self, id: AlertId, after: Duration) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(id, "No async runtime; alert will not auto-dismiss");
            return None;
        };

        let state: Weak<Mutex<AlertState>> = Arc::downgrade(&self.inner);
        Some(runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(state) = state.upgrade() {
                let expired = state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take(id);
                if expired.is_some() {
                    tracing::debug!(id, "Alert expired");
                }
            }
        }))
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.lock()
            .alerts
            .iter()
            .filter(|s| s.timer.as_ref().is_some_and(|t| !t.is_finished()))
            .count()
    }
}

impl AlertSink for AlertStore {
    fn add_info_alert(&self, message: &str) -> Option<Alert> {
        Some(AlertStore::add_info_alert(self, message))
    }

    fn add_success_alert(&self, message: &str) -> Option<Alert> {
        Some(AlertStore::add_success_alert(self, message, None))
    }

    fn add_error_alert(
        &self,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) -> Option<Alert> {
        AlertStore::add_error_alert(self, message, error)
    }

    fn remove_alert_by_id(&self, id: AlertId) -> Option<Alert> {
        AlertStore::remove_alert_by_id(self, id)
    }
}
