//! cmp-applets - applet registry and target resolution for the CMP UI.
//!
//! Applets are UI plugins loaded into the CMP web application at runtime.
//! This crate fetches their definitions once, indexes them by page and
//! area for the active target application, and answers which applets
//! belong at a given spot.
//!
//! # Architecture
//!
//! The library is organized into these main modules:
//!
//! - [`applets`] - Applet descriptors, the page/area index and the registry store
//! - [`alerts`] - Notification store and the alert callbacks the registry reports through
//! - [`user`] - Current user state
//! - [`config`] - Configuration loading and management
//!
//! # Example
//!
//! ```ignore
//! use cmp_applets::{AlertStore, AppletStore, FetchOptions, HttpAppletApi};
//!
//! let store = AppletStore::new("cui");
//! let alerts = AlertStore::new();
//! let api = HttpAppletApi::new("https://cmp.example.com");
//!
//! store.fetch_applets(&api, Some(&alerts), &FetchOptions::default()).await;
//! let applets = store.get_applets_for_target("resourceDetail", "postActions", None)?;
//! ```

pub mod alerts;
pub mod applets;
pub mod cli;
pub mod config;
pub mod user;

mod error;

pub use alerts::{Alert, AlertSink, AlertStore, AlertType, LogAlerts};
pub use applets::{
    Applet, AppletApi, AppletIndex, AppletStore, AreaEntry, FetchOptions, FileAppletApi,
    HttpAppletApi, LoadState,
};
pub use config::Config;
pub use error::{Cancelled, CmpError, CmpResult};
pub use user::{User, UserStore};
