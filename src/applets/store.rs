//! Applet registry state and queries.
//!
//! The store owns the fetched applet list and the active target
//! application. Derived views (the page/area index, the id lookup and the
//! stylesheet list) are computed on first use and dropped whenever the
//! applets or the target application change.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::OnceCell;

use crate::alerts::{AlertId, AlertSink, LogAlerts};
use crate::config::MessagesConfig;
use crate::error::Cancelled;

use super::api::AppletApi;
use super::error::{ApiError, AppletError, AppletResult};
use super::index::AppletIndex;
use super::manifest::Applet;
use super::AppletId;

/// Message used when a fetch fails and no error message was configured.
pub const DEFAULT_ERROR_MESSAGE: &str = "Failed to fetch applets";

/// Alert messages shown around [`AppletStore::fetch_applets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub loading_message: Option<String>,
    pub loaded_message: Option<String>,
    pub error_message: Option<String>,
}

impl From<&MessagesConfig> for FetchOptions {
    fn from(messages: &MessagesConfig) -> Self {
        Self {
            loading_message: messages.loading.clone(),
            loaded_message: messages.loaded.clone(),
            error_message: messages.error.clone(),
        }
    }
}

/// Where the store is in its single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
}

/// Views computed from the applets and target application.
#[derive(Default)]
struct Derived {
    enabled: OnceCell<Arc<[Arc<Applet>]>>,
    index: OnceCell<Arc<AppletIndex>>,
    by_id: OnceCell<HashMap<AppletId, Arc<Applet>>>,
    css_hrefs: OnceCell<Arc<[String]>>,
}

struct StoreState {
    applets: Vec<Arc<Applet>>,
    target_application: String,
    is_loading: bool,
    has_loaded: bool,
    last_error: Option<Arc<ApiError>>,
    derived: Derived,
}

impl StoreState {
    fn new(target_application: String) -> Self {
        Self {
            applets: Vec::new(),
            target_application,
            is_loading: false,
            has_loaded: false,
            last_error: None,
            derived: Derived::default(),
        }
    }

    fn invalidate(&mut self) {
        self.derived = Derived::default();
    }

    fn enabled(&self) -> &Arc<[Arc<Applet>]> {
        self.derived.enabled.get_or_init(|| {
            self.applets
                .iter()
                .filter(|applet| applet.enabled)
                .cloned()
                .collect()
        })
    }

    fn index(&self) -> AppletResult<&Arc<AppletIndex>> {
        if self.target_application.is_empty() {
            return Err(AppletError::MissingTargetApplication);
        }
        Ok(self.derived.index.get_or_init(|| {
            let enabled = self.enabled();
            tracing::debug!(
                target_application = %self.target_application,
                applets = enabled.len(),
                "Rebuilding applet index"
            );
            Arc::new(AppletIndex::build(enabled.iter(), &self.target_application))
        }))
    }
}

/// Settles a fetch whose future is dropped before the API answers.
///
/// The store ends up loaded with a cancellation error and the loading
/// alert is removed, as if the request had been cancelled.
struct FetchGuard<'a> {
    store: &'a AppletStore,
    alerts: &'a dyn AlertSink,
    loading_alert: Option<AlertId>,
    armed: bool,
}

impl FetchGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::debug!("Applet fetch dropped before completion");
        {
            let mut state = self.store.write();
            state.is_loading = false;
            state.has_loaded = true;
            state.last_error = Some(Arc::new(ApiError::Cancelled(Cancelled)));
        }
        if let Some(id) = self.loading_alert {
            self.alerts.remove_alert_by_id(id);
        }
    }
}

/// Registry of fetched applets for one target application.
///
/// Shared by reference between consumers; all methods take `&self`.
pub struct AppletStore {
    state: RwLock<StoreState>,
}

impl Default for AppletStore {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for AppletStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("AppletStore")
            .field("applets", &state.applets.len())
            .field("target_application", &state.target_application)
            .field("is_loading", &state.is_loading)
            .field("has_loaded", &state.has_loaded)
            .field("last_error", &state.last_error)
            .finish()
    }
}

impl AppletStore {
    /// Create an empty store resolving targets for `target_application`.
    pub fn new(target_application: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(StoreState::new(target_application.into())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn target_application(&self) -> String {
        self.read().target_application.clone()
    }

    /// Switch the namespace targets are resolved in.
    pub fn set_target_application(&self, target_application: impl Into<String>) {
        let target_application = target_application.into();
        let mut state = self.write();
        if state.target_application != target_application {
            state.target_application = target_application;
            state.invalidate();
        }
    }

    /// Every fetched applet, enabled or not.
    pub fn applets(&self) -> Vec<Arc<Applet>> {
        self.read().applets.clone()
    }

    /// Replace the applet list.
    pub fn set_applets(&self, applets: Vec<Applet>) {
        let mut state = self.write();
        state.applets = applets.into_iter().map(Arc::new).collect();
        state.invalidate();
    }

    /// Append one applet. Pushing the same `Arc` twice keeps both entries.
    pub fn push_applet(&self, applet: impl Into<Arc<Applet>>) {
        let mut state = self.write();
        state.applets.push(applet.into());
        state.invalidate();
    }

    /// The enabled subset of [`applets`](Self::applets), in list order.
    pub fn applets_enabled(&self) -> Vec<Arc<Applet>> {
        self.read().enabled().to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    pub fn has_loaded(&self) -> bool {
        self.read().has_loaded
    }

    pub fn load_state(&self) -> LoadState {
        let state = self.read();
        match (state.is_loading, state.has_loaded) {
            (true, _) => LoadState::Loading,
            (false, true) => LoadState::Loaded,
            (false, false) => LoadState::Idle,
        }
    }

    /// The failure from the last fetch, if it failed.
    pub fn last_error(&self) -> Option<Arc<ApiError>> {
        self.read().last_error.clone()
    }

    /// The page/area index for the current applets and namespace.
    ///
    /// Fails when no target application is set.
    pub fn applets_index(&self) -> AppletResult<Arc<AppletIndex>> {
        self.read().index().cloned()
    }

    /// Look up an applet by id, enabled or not.
    pub fn get_applet(&self, id: &str) -> Option<Arc<Applet>> {
        let state = self.read();
        state
            .derived
            .by_id
            .get_or_init(|| {
                state
                    .applets
                    .iter()
                    .map(|applet| (applet.id.clone(), Arc::clone(applet)))
                    .collect()
            })
            .get(id)
            .cloned()
    }

    /// Applets to render at `page`/`area`, wildcard targets included.
    ///
    /// See [`AppletIndex::resolve`] for ordering and filtering. The only
    /// error is a missing target application.
    pub fn get_applets_for_target(
        &self,
        page: &str,
        area: &str,
        filter: Option<&str>,
    ) -> AppletResult<Vec<Arc<Applet>>> {
        Ok(self.read().index()?.resolve(page, area, filter))
    }

    /// Deduplicated stylesheet URLs of the enabled applets, in list order.
    pub fn applets_css_hrefs(&self) -> Vec<String> {
        let state = self.read();
        state
            .derived
            .css_hrefs
            .get_or_init(|| {
                let mut hrefs: Vec<String> = Vec::new();
                for href in state.enabled().iter().map(|applet| applet.css_href()) {
                    if !hrefs.contains(&href) {
                        hrefs.push(href);
                    }
                }
                hrefs.into()
            })
            .to_vec()
    }

    /// Fetch the applet list once.
    ///
    /// Returns immediately while a fetch is in flight or after one has
    /// finished, whether it succeeded or failed; call [`reset`](Self::reset)
    /// to allow another attempt. Failures are recorded in
    /// [`last_error`](Self::last_error) and reported through `alerts`
    /// (or the log when `alerts` is `None`), never returned. Dropping the
    /// future mid-request settles the store as a cancelled fetch.
    pub async fn fetch_applets<A: AppletApi>(
        &self,
        api: &A,
        alerts: Option<&dyn AlertSink>,
        options: &FetchOptions,
    ) {
        {
            let mut state = self.write();
            if state.has_loaded || state.is_loading {
                return;
            }
            state.is_loading = true;
        }

        let alerts: &dyn AlertSink = alerts.unwrap_or(&LogAlerts);
        let loading_alert = options
            .loading_message
            .as_deref()
            .and_then(|message| alerts.add_info_alert(message));
        let mut guard = FetchGuard {
            store: self,
            alerts,
            loading_alert: loading_alert.as_ref().map(|alert| alert.id),
            armed: true,
        };

        tracing::info!("Fetching applets");
        let result = api.list().await;
        guard.disarm();

        let succeeded = {
            let mut state = self.write();
            let succeeded = match result {
                Ok(list) => {
                    tracing::info!(count = list.items.len(), "Fetched applets");
                    state.applets = list.items.into_iter().map(Arc::new).collect();
                    state.last_error = None;
                    state.invalidate();
                    true
                }
                Err(err) => {
                    if err.is_cancelled() {
                        tracing::debug!("Applet fetch cancelled");
                    } else {
                        tracing::warn!(error = %err, "Failed to fetch applets");
                    }
                    state.last_error = Some(Arc::new(err));
                    false
                }
            };
            state.is_loading = false;
            state.has_loaded = true;
            succeeded
        };

        if !succeeded {
            let message = options
                .error_message
                .as_deref()
                .unwrap_or(DEFAULT_ERROR_MESSAGE);
            let error = self.last_error();
            alerts.add_error_alert(
                message,
                error.as_deref().map(|e| e as &(dyn std::error::Error + 'static)),
            );
        }

        if let Some(alert) = loading_alert {
            alerts.remove_alert_by_id(alert.id);
        }

        if succeeded {
            if let Some(ref message) = options.loaded_message {
                alerts.add_success_alert(message);
            }
        }
    }

    /// Return to the initial, never-fetched state, keeping the namespace.
    pub fn reset(&self) {
        let mut state = self.write();
        let target_application = std::mem::take(&mut state.target_application);
        *state = StoreState::new(target_application);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::json;

    use crate::alerts::{Alert, AlertId, AlertStore, AlertType};
    use crate::applets::{AppletList, ApiResult};

    fn mock_applet() -> Applet {
        serde_json::from_value(json!({
            "id": "APL-vwddynrk",
            "enabled": true,
            "entryComponent": "/static/uploads/applets/cui-applet/cui-applet/static/main.es.js",
            "targets": {
                "cui": {
                    "resourceDetail": ["postActions", "all"],
                    "all": ["preNavItems", "header", "all"],
                    "resourceDetailsTabs": [{}]
                }
            }
        }))
        .unwrap()
    }

    fn with_targets(targets: serde_json::Value) -> Applet {
        Applet {
            targets: serde_json::from_value(targets).unwrap(),
            ..mock_applet()
        }
    }

    fn ids(applets: &[Arc<Applet>]) -> Vec<&str> {
        applets.iter().map(|a| a.id.as_str()).collect()
    }

    /// Applet API that counts calls and yields once before answering.
    struct MockApi {
        response: Result<AppletList, String>,
        cancelled: bool,
        calls: AtomicUsize,
        store: Option<Arc<AppletStore>>,
        saw_loading: AtomicBool,
    }

    impl MockApi {
        fn ok(items: Vec<Applet>) -> Self {
            Self {
                response: Ok(AppletList { items }),
                cancelled: false,
                calls: AtomicUsize::new(0),
                store: None,
                saw_loading: AtomicBool::new(false),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                ..Self::ok(Vec::new())
            }
        }

        fn cancelled() -> Self {
            Self {
                cancelled: true,
                ..Self::ok(Vec::new())
            }
        }

        fn watching(mut self, store: &Arc<AppletStore>) -> Self {
            self.store = Some(Arc::clone(store));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AppletApi for MockApi {
        async fn list(&self) -> ApiResult<AppletList> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ref store) = self.store {
                self.saw_loading.store(store.is_loading(), Ordering::SeqCst);
            }
            tokio::task::yield_now().await;
            if self.cancelled {
                return Err(ApiError::Cancelled(Cancelled));
            }
            self.response.clone().map_err(ApiError::Unavailable)
        }
    }

    /// Applet API whose request never completes.
    struct PendingApi;

    impl AppletApi for PendingApi {
        async fn list(&self) -> ApiResult<AppletList> {
            std::future::pending().await
        }
    }

    /// Alert sink that records every call.
    #[derive(Default)]
    struct RecordingAlerts {
        events: Mutex<Vec<String>>,
        next_id: AtomicUsize,
    }

    impl RecordingAlerts {
        fn record(&self, kind: AlertType, message: &str) -> Option<Alert> {
            self.events.lock().unwrap().push(format!("{}:{}", kind, message));
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as AlertId + 1;
            Some(Alert {
                id,
                kind,
                message: message.to_string(),
                closable: true,
                timeout: 0,
                icon: None,
                route_options: None,
            })
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AlertSink for RecordingAlerts {
        fn add_info_alert(&self, message: &str) -> Option<Alert> {
            self.record(AlertType::Info, message)
        }

        fn add_success_alert(&self, message: &str) -> Option<Alert> {
            self.record(AlertType::Success, message)
        }

        fn add_error_alert(
            &self,
            message: &str,
            error: Option<&(dyn Error + 'static)>,
        ) -> Option<Alert> {
            let message = match error {
                Some(error) => format!("{} ({})", message, error),
                None => message.to_string(),
            };
            self.record(AlertType::Error, &message)
        }

        fn remove_alert_by_id(&self, id: AlertId) -> Option<Alert> {
            self.events.lock().unwrap().push(format!("remove:{}", id));
            None
        }
    }

    fn messages() -> FetchOptions {
        FetchOptions {
            loading_message: Some("Loading applets".into()),
            loaded_message: Some("Applets loaded".into()),
            error_message: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let store = AppletStore::new("cui");
        assert!(store.applets().is_empty());
        assert!(store.last_error().is_none());
        assert!(!store.is_loading());
        assert!(!store.has_loaded());
        assert_eq!(store.load_state(), LoadState::Idle);
    }

    #[test]
    fn test_applets_enabled() {
        let store = AppletStore::new("cui");
        store.push_applet(mock_applet());
        store.push_applet(Applet {
            id: "APL-off".into(),
            enabled: false,
            ..mock_applet()
        });

        assert_eq!(store.applets().len(), 2);
        assert_eq!(ids(&store.applets_enabled()), vec!["APL-vwddynrk"]);
    }

    #[test]
    fn test_index_excludes_disabled_applets() {
        let store = AppletStore::new("cui");
        store.push_applet(Applet {
            enabled: false,
            ..mock_applet()
        });

        let index = store.applets_index().unwrap();
        assert!(index.area("all", "all").is_empty());
        assert!(index.area("all", "preNavItems").is_empty());
        assert!(index.area("resourceDetail", "all").is_empty());
        assert!(index.area("resourceDetail", "postActions").is_empty());
        assert!(store
            .get_applets_for_target("resourceDetail", "postActions", None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_target_application() {
        let store = AppletStore::default();
        store.push_applet(mock_applet());

        let err = store.applets_index().unwrap_err();
        assert!(matches!(err, AppletError::MissingTargetApplication));
        assert!(err.to_string().contains("targetApplication"));
        assert!(store.get_applets_for_target("resourceDetail", "postActions", None).is_err());

        store.set_target_application("cui");
        assert_eq!(
            ids(&store.get_applets_for_target("resourceDetail", "postActions", None).unwrap()),
            vec!["APL-vwddynrk"]
        );
    }

    #[test]
    fn test_page_and_area_target() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({ "cui": { "resourceDetail": ["postActions"] } })));

        assert_eq!(store.get_applets_for_target("resourceDetail", "postActions", None).unwrap().len(), 1);
        assert!(store.get_applets_for_target("resourceDetail", "header", None).unwrap().is_empty());
        assert!(store.get_applets_for_target("anotherPage", "postActions", None).unwrap().is_empty());
    }

    #[test]
    fn test_page_and_all_areas_target() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({ "cui": { "resourceDetail": ["all"] } })));

        for area in ["postActions", "header", "somethingElse"] {
            assert_eq!(store.get_applets_for_target("resourceDetail", area, None).unwrap().len(), 1);
        }
        assert!(store.get_applets_for_target("anotherPage", "postActions", None).unwrap().is_empty());
    }

    #[test]
    fn test_all_pages_and_area_target() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({ "cui": { "all": ["postActions"] } })));

        for page in ["resourceDetail", "dashboard"] {
            assert_eq!(store.get_applets_for_target(page, "postActions", None).unwrap().len(), 1);
        }
        assert!(store.get_applets_for_target("resourceDetail", "header", None).unwrap().is_empty());
    }

    #[test]
    fn test_all_pages_and_all_areas_target() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({ "cui": { "all": ["all"] } })));

        assert_eq!(store.get_applets_for_target("resourceDetail", "postActions", None).unwrap().len(), 1);
        assert_eq!(store.get_applets_for_target("x", "y", None).unwrap().len(), 1);
    }

    #[test]
    fn test_no_duplicates_across_rules() {
        let store = AppletStore::new("cui");
        store.push_applet(mock_applet());

        let applets = store.get_applets_for_target("resourceDetail", "postActions", None).unwrap();
        assert_eq!(applets.len(), 1);
    }

    #[test]
    fn test_example_resolution() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({ "cui": { "resourceDetail": ["postActions", "all"] } })));
        let store_ids = |page: &str, area: &str| -> Vec<String> {
            store
                .get_applets_for_target(page, area, None)
                .unwrap()
                .iter()
                .map(|a| a.id.clone())
                .collect()
        };

        assert_eq!(store_ids("resourceDetail", "postActions"), vec!["APL-vwddynrk"]);
        assert_eq!(store_ids("resourceDetail", "header"), vec!["APL-vwddynrk"]);
        assert!(store_ids("otherPage", "postActions").is_empty());
    }

    #[test]
    fn test_other_namespace_is_not_resolved() {
        let store = AppletStore::new("hui");
        store.push_applet(mock_applet());
        assert!(store.get_applets_for_target("resourceDetail", "postActions", None).unwrap().is_empty());
    }

    #[test]
    fn test_switching_namespace_rebuilds_index() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({
            "cui": { "resourceDetail": ["postActions"] },
            "hui": { "serverList": ["toolbar"] }
        })));

        assert_eq!(store.get_applets_for_target("resourceDetail", "postActions", None).unwrap().len(), 1);

        store.set_target_application("hui");
        assert!(store.get_applets_for_target("resourceDetail", "postActions", None).unwrap().is_empty());
        assert_eq!(store.get_applets_for_target("serverList", "toolbar", None).unwrap().len(), 1);
    }

    #[test]
    fn test_index_is_memoized_until_mutation() {
        let store = AppletStore::new("cui");
        store.push_applet(mock_applet());

        let first = store.applets_index().unwrap();
        let second = store.applets_index().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.push_applet(Applet {
            id: "APL-2".into(),
            ..mock_applet()
        });
        let third = store.applets_index().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.area("resourceDetail", "postActions").len(), 2);
    }

    #[test]
    fn test_filter_by_id_or_name() {
        let store = AppletStore::new("cui");
        store.push_applet(mock_applet());
        store.push_applet(Applet {
            id: "APL-2".into(),
            name: Some("costs".into()),
            ..mock_applet()
        });

        let by_name = store.get_applets_for_target("resourceDetail", "postActions", Some("costs")).unwrap();
        assert_eq!(ids(&by_name), vec!["APL-2"]);

        let by_id = store
            .get_applets_for_target("resourceDetail", "postActions", Some("APL-vwddynrk"))
            .unwrap();
        assert_eq!(ids(&by_id), vec!["APL-vwddynrk"]);
    }

    #[test]
    fn test_positioned_tabs() {
        let store = AppletStore::new("cui");
        store.push_applet(with_targets(json!({
            "cui": {
                "resourceDetailsTabs": [{ "resourceTypes": ["server"], "position": ["tabA", "tabB"] }]
            }
        })));

        assert_eq!(store.get_applets_for_target("resourceDetailsTabs", "tabA", None).unwrap().len(), 1);
        assert_eq!(store.get_applets_for_target("resourceDetailsTabs", "tabB", None).unwrap().len(), 1);
        assert!(store.get_applets_for_target("resourceDetailsTabs", "tabC", None).unwrap().is_empty());
    }

    #[test]
    fn test_css_hrefs() {
        let store = AppletStore::new("cui");
        assert!(store.applets_css_hrefs().is_empty());

        store.push_applet(Applet {
            enabled: false,
            ..mock_applet()
        });
        assert!(store.applets_css_hrefs().is_empty());

        let shared = Arc::new(mock_applet());
        store.push_applet(Arc::clone(&shared));
        store.push_applet(shared);
        store.push_applet(Applet {
            id: "APL-sibling".into(),
            entry_component: "/static/uploads/applets/cui-applet/cui-applet/static/other.js".into(),
            ..mock_applet()
        });

        assert_eq!(
            store.applets_css_hrefs(),
            vec!["/static/uploads/applets/cui-applet/cui-applet/static/style.css".to_string()]
        );
    }

    #[test]
    fn test_css_hrefs_follow_enabled_order() {
        let store = AppletStore::new("cui");
        store.set_applets(vec![
            Applet::new("b", "/b/main.js"),
            Applet::new("a", "/a/main.js"),
            Applet::new("b2", "/b/entry.js"),
        ]);
        assert_eq!(store.applets_css_hrefs(), vec!["/b/style.css", "/a/style.css"]);
    }

    #[test]
    fn test_get_applet() {
        let store = AppletStore::new("cui");
        store.push_applet(mock_applet());
        store.push_applet(Applet {
            id: "APL-off".into(),
            enabled: false,
            ..mock_applet()
        });

        assert_eq!(*store.get_applet("APL-vwddynrk").unwrap(), mock_applet());
        assert!(store.get_applet("APL-off").is_some());
        assert!(store.get_applet("APL-123").is_none());
    }

    #[tokio::test]
    async fn test_fetch_sets_state() {
        let store = Arc::new(AppletStore::new("cui"));
        let api = MockApi::ok(vec![mock_applet()]).watching(&store);

        store.fetch_applets(&api, None, &FetchOptions::default()).await;

        assert!(api.saw_loading.load(Ordering::SeqCst));
        assert!(!store.is_loading());
        assert!(store.has_loaded());
        assert_eq!(store.load_state(), LoadState::Loaded);
        assert_eq!(api.calls(), 1);
        assert_eq!(*store.applets()[0], mock_applet());
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_only_calls_api_once() {
        let store = AppletStore::new("cui");
        let api = MockApi::ok(vec![mock_applet()]);

        store.fetch_applets(&api, None, &FetchOptions::default()).await;
        store.fetch_applets(&api, None, &FetchOptions::default()).await;

        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_call_api_once() {
        let store = AppletStore::new("cui");
        let api = MockApi::ok(vec![mock_applet()]);
        let options = FetchOptions::default();

        tokio::join!(
            store.fetch_applets(&api, None, &options),
            store.fetch_applets(&api, None, &options),
        );

        assert_eq!(api.calls(), 1);
        assert_eq!(store.applets().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_success_alerts() {
        let store = AppletStore::new("cui");
        let api = MockApi::ok(vec![mock_applet()]);
        let alerts = RecordingAlerts::default();

        store.fetch_applets(&api, Some(&alerts), &messages()).await;

        assert_eq!(
            alerts.events(),
            vec!["info:Loading applets", "remove:1", "success:Applets loaded"]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_recorded_and_reported() {
        let store = AppletStore::new("cui");
        let api = MockApi::failing("connection refused");
        let alerts = RecordingAlerts::default();

        store.fetch_applets(&api, Some(&alerts), &messages()).await;

        assert!(store.has_loaded());
        assert!(!store.is_loading());
        assert!(store.applets().is_empty());
        assert!(matches!(
            store.last_error().as_deref(),
            Some(ApiError::Unavailable(msg)) if msg == "connection refused"
        ));
        assert_eq!(
            alerts.events(),
            vec![
                "info:Loading applets",
                "error:Failed to fetch applets (Applet API unavailable: connection refused)",
                "remove:1",
            ]
        );

        // No automatic retry
        store.fetch_applets(&api, Some(&alerts), &messages()).await;
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_raises_no_error_alert() {
        let store = AppletStore::new("cui");
        let api = MockApi::cancelled();
        let alerts = AlertStore::new();

        store.fetch_applets(&api, Some(&alerts), &messages()).await;

        assert!(store.has_loaded());
        assert!(!store.is_loading());
        assert!(store.last_error().is_some_and(|err| err.is_cancelled()));
        assert!(alerts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_fetch_settles_store() {
        let store = AppletStore::new("cui");
        let alerts = AlertStore::new();
        let options = messages();

        let fetch = store.fetch_applets(&PendingApi, Some(&alerts), &options);
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), fetch).await;
        assert!(timed_out.is_err());

        assert_eq!(store.load_state(), LoadState::Loaded);
        assert!(store.last_error().is_some_and(|err| err.is_cancelled()));
        assert!(alerts.is_empty());

        // Settled, so a second fetch is a no-op until reset
        let api = MockApi::ok(vec![mock_applet()]);
        store.fetch_applets(&api, Some(&alerts), &messages()).await;
        assert_eq!(api.calls(), 0);

        store.reset();
        store.fetch_applets(&api, Some(&alerts), &messages()).await;
        assert_eq!(api.calls(), 1);
        assert_eq!(store.load_state(), LoadState::Loaded);
        assert_eq!(store.applets().len(), 1);
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_custom_message() {
        let store = AppletStore::new("cui");
        let api = MockApi::failing("down");
        let alerts = RecordingAlerts::default();
        let options = FetchOptions {
            error_message: Some("Applets unavailable".into()),
            ..Default::default()
        };

        store.fetch_applets(&api, Some(&alerts), &options).await;

        assert_eq!(alerts.events(), vec!["error:Applets unavailable (Applet API unavailable: down)"]);
    }

    #[tokio::test]
    async fn test_reset_allows_retry() {
        let store = AppletStore::new("cui");
        let failing = MockApi::failing("down");
        store.fetch_applets(&failing, None, &FetchOptions::default()).await;
        assert!(store.last_error().is_some());

        store.reset();
        assert_eq!(store.load_state(), LoadState::Idle);
        assert!(store.last_error().is_none());
        assert_eq!(store.target_application(), "cui");

        let api = MockApi::ok(vec![mock_applet()]);
        store.fetch_applets(&api, None, &FetchOptions::default()).await;
        assert_eq!(api.calls(), 1);
        assert_eq!(store.applets().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_with_alert_store() {
        let store = AppletStore::new("cui");
        let api = MockApi::ok(vec![mock_applet()]);
        let alerts = AlertStore::new();

        store.fetch_applets(&api, Some(&alerts), &messages()).await;

        let remaining = alerts.alerts();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].kind, AlertType::Success);
        assert_eq!(remaining[0].message, "Applets loaded");
    }

    #[tokio::test]
    async fn test_fetched_applets_resolve() {
        let store = AppletStore::new("cui");
        let api = MockApi::ok(vec![mock_applet()]);
        store.fetch_applets(&api, None, &FetchOptions::default()).await;

        assert_eq!(store.get_applets_for_target("dashboard", "header", None).unwrap().len(), 1);
        assert_eq!(store.applets_css_hrefs().len(), 1);
    }
}
