//! Page/area lookup index over enabled applets.
//!
//! Built once per (enabled applets, target application) pair and shared
//! behind an `Arc` until either input changes.
//!
//! ```text
//! AppletIndex
//! └── pages: HashMap<page, PageTargets>
//!     ├── areas: HashMap<area, Vec<Arc<Applet>>>   (named + positioned entries)
//!     ├── configured: Vec<Arc<Applet>>             (unpositioned entries)
//!     └── placements: Vec<Placement>               (config objects, in order)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::manifest::{Applet, AreaEntry, ALL};

/// A configuration object together with the applet that declared it.
#[derive(Debug, Clone)]
pub struct Placement {
    pub applet: Arc<Applet>,

    /// Areas the configuration is attached to; empty for page-level config.
    pub position: Vec<String>,

    pub config: Map<String, Value>,
}

/// Everything indexed for one page.
#[derive(Debug, Clone, Default)]
pub struct PageTargets {
    areas: HashMap<String, Vec<Arc<Applet>>>,
    configured: Vec<Arc<Applet>>,
    placements: Vec<Placement>,
}

impl PageTargets {
    /// Applets attached to a named area, in encounter order.
    pub fn area(&self, area: &str) -> &[Arc<Applet>] {
        self.areas.get(area).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of every area with at least one applet.
    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.areas.keys().map(String::as_str)
    }

    /// Applets attached to the page through unpositioned configuration.
    pub fn configured(&self) -> &[Arc<Applet>] {
        &self.configured
    }

    /// Every configuration object declared for this page.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    fn push_area(&mut self, area: &str, applet: &Arc<Applet>) {
        self.areas
            .entry(area.to_string())
            .or_default()
            .push(Arc::clone(applet));
    }
}

/// Lookup structure from page and area to applets.
#[derive(Debug, Clone, Default)]
pub struct AppletIndex {
    pages: HashMap<String, PageTargets>,
}

impl AppletIndex {
    /// Build the index for a namespace from the enabled applets.
    ///
    /// Callers pass only enabled applets; the index does not filter.
    pub fn build<'a, I>(applets: I, namespace: &str) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Applet>>,
    {
        let mut pages: HashMap<String, PageTargets> = HashMap::new();

        for applet in applets {
            let Some(spec) = applet.target_spec(namespace) else {
                continue;
            };

            for (page, entries) in spec {
                for entry in entries {
                    let targets = pages.entry(page.clone()).or_default();
                    match entry {
                        AreaEntry::Area(area) => targets.push_area(area, applet),
                        AreaEntry::Positioned { position, config } => {
                            for area in position {
                                targets.push_area(area, applet);
                            }
                            targets.placements.push(Placement {
                                applet: Arc::clone(applet),
                                position: position.clone(),
                                config: config.clone(),
                            });
                        }
                        AreaEntry::Config(config) => {
                            targets.configured.push(Arc::clone(applet));
                            targets.placements.push(Placement {
                                applet: Arc::clone(applet),
                                position: Vec::new(),
                                config: config.clone(),
                            });
                        }
                    }
                }
            }
        }

        Self { pages }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, page: &str) -> Option<&PageTargets> {
        self.pages.get(page)
    }

    pub fn pages(&self) -> impl Iterator<Item = (&str, &PageTargets)> {
        self.pages.iter().map(|(name, targets)| (name.as_str(), targets))
    }

    /// Applets stored directly at `page`/`area`, without wildcard fallback.
    pub fn area(&self, page: &str, area: &str) -> &[Arc<Applet>] {
        self.page(page).map(|p| p.area(area)).unwrap_or(&[])
    }

    /// Applets attached to `page` through unpositioned configuration.
    pub fn configured(&self, page: &str) -> &[Arc<Applet>] {
        self.page(page).map(PageTargets::configured).unwrap_or(&[])
    }

    /// Configuration objects declared for `page`.
    pub fn placements(&self, page: &str) -> &[Placement] {
        self.page(page).map(PageTargets::placements).unwrap_or(&[])
    }

    /// Applets to render at `page`/`area`, wildcards included.
    ///
    /// Concatenates `page/area`, `page/all`, `all/area` and `all/all`, then
    /// keeps the first occurrence of each applet. When `filter` is given and
    /// non-empty only applets whose id or name equals it are kept.
    pub fn resolve(&self, page: &str, area: &str, filter: Option<&str>) -> Vec<Arc<Applet>> {
        let filter = filter.filter(|key| !key.is_empty());
        let candidates = self
            .area(page, area)
            .iter()
            .chain(self.area(page, ALL))
            .chain(self.area(ALL, area))
            .chain(self.area(ALL, ALL));

        let mut resolved: Vec<Arc<Applet>> = Vec::new();
        for applet in candidates {
            if filter.is_some_and(|key| !applet.matches_key(key)) {
                continue;
            }
            if !resolved.iter().any(|seen| Arc::ptr_eq(seen, applet)) {
                resolved.push(Arc::clone(applet));
            }
        }
        resolved
    }
}
