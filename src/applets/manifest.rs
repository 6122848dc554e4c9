//! Applet descriptors as returned by the applet API.
//!
//! Each applet declares, per target application (e.g. `cui`, `hui`), which
//! pages it renders on and in which areas:
//!
//! ```json
//! {
//!   "id": "APL-1",
//!   "enabled": true,
//!   "entryComponent": "/static/uploads/applets/demo/main.es.js",
//!   "targets": {
//!     "cui": {
//!       "resourceDetail": ["postActions", "all"],
//!       "resourceDetailsTabs": [{ "resourceTypes": ["server"], "position": ["tabA"] }],
//!       "all": ["header"]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AppletId;

/// Reserved page/area key matching every page or every area.
pub const ALL: &str = "all";

/// Field name used for positioned configuration objects.
pub const POSITION_KEY: &str = "position";

/// Older applets spell the position field `location`.
const LEGACY_POSITION_KEY: &str = "location";

/// Page name (or `all`) to the ordered area entries for that page.
pub type TargetSpec = BTreeMap<String, Vec<AreaEntry>>;

/// A plugin descriptor.
///
/// The API returns more properties than these; anything not modelled here
/// is kept in [`Applet::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applet {
    pub id: AppletId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub enabled: bool,

    /// Path or URL of the applet's loadable bundle.
    #[serde(default)]
    pub entry_component: String,

    /// Target application namespace to target spec.
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Applet {
    /// Create an enabled applet with no targets.
    pub fn new(id: impl Into<AppletId>, entry_component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            label: None,
            enabled: true,
            entry_component: entry_component.into(),
            targets: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Add a page target under the given namespace.
    pub fn with_target(
        mut self,
        namespace: &str,
        page: &str,
        areas: impl IntoIterator<Item = AreaEntry>,
    ) -> Self {
        self.targets
            .entry(namespace.to_string())
            .or_default()
            .entry(page.to_string())
            .or_default()
            .extend(areas);
        self
    }

    /// The target spec for a namespace, if the applet has one.
    pub fn target_spec(&self, namespace: &str) -> Option<&TargetSpec> {
        self.targets.get(namespace)
    }

    /// Whether `key` names this applet, by id or by name.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id == key || self.name.as_deref() == Some(key)
    }

    /// Stylesheet URL: the entry component's file name replaced by `style.css`.
    ///
    /// Paths without a final file segment are returned unchanged.
    pub fn css_href(&self) -> String {
        match self.entry_component.rfind('/') {
            Some(idx) if idx + 1 < self.entry_component.len() => {
                format!("{}/style.css", &self.entry_component[..idx])
            }
            _ => self.entry_component.clone(),
        }
    }
}

/// One entry in a page's area list.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaEntry {
    /// A named area, or [`ALL`] for every area on the page.
    Area(String),

    /// Configuration attached to each of the listed areas.
    Positioned {
        position: Vec<String>,
        config: Map<String, Value>,
    },

    /// Configuration attached to the page as a whole.
    Config(Map<String, Value>),
}

impl AreaEntry {
    pub fn area(name: impl Into<String>) -> Self {
        AreaEntry::Area(name.into())
    }

    /// The configuration fields of an object entry.
    pub fn config(&self) -> Option<&Map<String, Value>> {
        match self {
            AreaEntry::Area(_) => None,
            AreaEntry::Positioned { config, .. } | AreaEntry::Config(config) => Some(config),
        }
    }
}

impl From<&str> for AreaEntry {
    fn from(name: &str) -> Self {
        AreaEntry::Area(name.to_string())
    }
}

/// Wire shape of an area entry before classification.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawAreaEntry {
    Area(String),
    Object(Map<String, Value>),
}

impl From<RawAreaEntry> for AreaEntry {
    fn from(raw: RawAreaEntry) -> Self {
        let mut config = match raw {
            RawAreaEntry::Area(name) => return AreaEntry::Area(name),
            RawAreaEntry::Object(config) => config,
        };

        let key = [POSITION_KEY, LEGACY_POSITION_KEY]
            .into_iter()
            .find(|key| config.get(*key).is_some_and(Value::is_array));

        match key.and_then(|key| config.remove(key)) {
            Some(Value::Array(items)) => AreaEntry::Positioned {
                position: items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(area) => Some(area),
                        _ => None,
                    })
                    .collect(),
                config,
            },
            _ => AreaEntry::Config(config),
        }
    }
}

impl From<AreaEntry> for RawAreaEntry {
    fn from(entry: AreaEntry) -> Self {
        match entry {
            AreaEntry::Area(name) => RawAreaEntry::Area(name),
            AreaEntry::Positioned {
                position,
                mut config,
            } => {
                config.insert(
                    POSITION_KEY.to_string(),
                    Value::Array(position.into_iter().map(Value::String).collect()),
                );
                RawAreaEntry::Object(config)
            }
            AreaEntry::Config(config) => RawAreaEntry::Object(config),
        }
    }
}

impl Serialize for AreaEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawAreaEntry::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AreaEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawAreaEntry::deserialize(deserializer).map(AreaEntry::from)
    }
}

/// Response body of the applet list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppletList {
    #[serde(default)]
    pub items: Vec<Applet>,
}
