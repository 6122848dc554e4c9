//! Alert data types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AlertError;

/// Unique identifier for an alert within one store.
pub type AlertId = u64;

/// Default auto-dismiss timeout (6 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 6 * 1000;

/// Kind of alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Info => "info",
            AlertType::Success => "success",
            AlertType::Warning => "warning",
            AlertType::Error => "error",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(AlertType::Info),
            "success" => Ok(AlertType::Success),
            "warning" => Ok(AlertType::Warning),
            "error" => Ok(AlertType::Error),
            other => Err(AlertError::InvalidType(other.to_string())),
        }
    }
}

/// Where a success alert links to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<RouteLocation>,
}

/// Router location of a [`RouteOptions`] link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RouteOptions {
    /// Route to a named page with an `id` param.
    pub fn to_record(name: impl Into<String>, id: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("id".to_string(), Value::String(id.into()));
        Self {
            id: None,
            name: None,
            to: Some(RouteLocation {
                name: Some(name.into()),
                params,
            }),
        }
    }

    /// Whether the link points at a specific record.
    pub fn targets_record(&self) -> bool {
        self.to
            .as_ref()
            .and_then(|to| to.params.get("id"))
            .is_some_and(|id| match id {
                Value::Null | Value::Bool(false) => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            })
    }
}

/// A notification shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,

    #[serde(rename = "type")]
    pub kind: AlertType,

    pub message: String,

    pub closable: bool,

    /// Milliseconds before auto-dismiss; 0 keeps the alert until removed.
    pub timeout: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_options: Option<RouteOptions>,
}

impl Alert {
    pub fn timeout_duration(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_millis(self.timeout))
    }
}

/// Partial alert; unset fields take their defaults.
///
/// `kind` stays a string so untrusted input is validated when the alert is
/// created rather than when it is parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDraft {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub closable: Option<bool>,

    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub icon: Option<String>,
}

impl AlertDraft {
    pub fn new(kind: AlertType, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub(crate) fn kind(&self) -> Result<Option<AlertType>, AlertError> {
        self.kind.as_deref().map(str::parse).transpose()
    }

    /// Apply over the defaults, validating the type.
    pub fn into_alert(
        self,
        id: AlertId,
        default_timeout: u64,
        route_options: Option<RouteOptions>,
    ) -> Result<Alert, AlertError> {
        let kind = self.kind()?.unwrap_or_default();
        Ok(self.build(kind, id, default_timeout, route_options))
    }

    /// Apply over the defaults with an already validated type.
    pub(crate) fn build(
        self,
        kind: AlertType,
        id: AlertId,
        default_timeout: u64,
        route_options: Option<RouteOptions>,
    ) -> Alert {
        Alert {
            id,
            kind,
            message: self.message.unwrap_or_default(),
            closable: self.closable.unwrap_or(true),
            timeout: self.timeout.unwrap_or(default_timeout),
            icon: self.icon,
            route_options,
        }
    }

    /// Overwrite the fields this draft sets.
    pub(crate) fn patch(self, alert: &mut Alert) -> Result<(), AlertError> {
        if let Some(kind) = self.kind()? {
            alert.kind = kind;
        }
        if let Some(message) = self.message {
            alert.message = message;
        }
        if let Some(closable) = self.closable {
            alert.closable = closable;
        }
        if let Some(timeout) = self.timeout {
            alert.timeout = timeout;
        }
        if self.icon.is_some() {
            alert.icon = self.icon;
        }
        Ok(())
    }
}
