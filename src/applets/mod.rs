//! Applet registry for the CMP UI.
//!
//! Applets are third-party UI plugins fetched from the CMP API. Each one
//! declares which pages and areas of a target application it renders in;
//! the store indexes them and answers "which applets go here" queries.
//!
//! # Architecture
//!
//! ```text
//! AppletStore
//! ├── applets: Vec<Arc<Applet>>          (fetched once through AppletApi)
//! ├── target_application: String        ("cui", "hui", ...)
//! ├── is_loading / has_loaded           (fetch-once guard)
//! └── derived (memoized, reset on mutation)
//!     ├── index: AppletIndex             page -> area -> applets
//!     ├── by_id: HashMap<AppletId, Arc<Applet>>
//!     └── css_hrefs: [String]
//! ```
//!
//! Lookups fall back through wildcard targets in a fixed order:
//! `page/area`, `page/all`, `all/area`, `all/all`.

pub mod api;
mod error;
pub mod index;
mod manifest;
mod store;

pub use api::{AppletApi, FileAppletApi, HttpAppletApi};
pub use error::{ApiError, ApiResult, AppletError, AppletResult};
pub use index::{AppletIndex, PageTargets, Placement};
pub use manifest::{Applet, AppletList, AreaEntry, TargetSpec, ALL, POSITION_KEY};
pub use store::{AppletStore, FetchOptions, LoadState, DEFAULT_ERROR_MESSAGE};

/// Unique identifier for an applet.
pub type AppletId = String;
