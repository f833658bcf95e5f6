//! Partial configuration records and their merge rule.
//!
//! A [`Config`] only carries the options that were explicitly provided. Every
//! field left to `None` means "inherit from the layer below": the default
//! configuration, then the innermost active scope, then the call site. See
//! [`ScopeManager`](crate::scope::ScopeManager) for how layers are resolved.
//!
//! # Examples
//!
//! ```rust
//! use stprogress::Config;
//!
//! let defaults = Config::new().desc("hello").frontend(false);
//! let call_site = Config::new().desc("world");
//!
//! let effective = defaults.merge(&call_site);
//! assert_eq!(effective.desc.as_deref(), Some("world"));
//! assert_eq!(effective.frontend, Some(false));
//! ```
//!
//! Configurations can also be loaded from JSON, for instance to share session
//! defaults:
//!
//! ```rust
//! use stprogress::Config;
//!
//! let config = Config::from_json_str(r#"{"desc": "loading", "delay": 0.5}"#)?;
//! assert_eq!(config.desc.as_deref(), Some("loading"));
//! # Ok::<(), stprogress::Error>(())
//! ```

use crate::ui::Container;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A partial set of progress options.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Label prefixed to the meter text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Keep the widgets visible once the progress completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave: Option<bool>,
    /// Width hint for the console meter. `0` disables the literal bar glyphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncols: Option<usize>,
    /// Suppress every update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    /// Template selecting which meter fragments are rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_format: Option<String>,
    /// Minimum elapsed time before the first display.
    #[serde(
        default,
        with = "duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<Duration>,
    /// Render into the UI widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<bool>,
    /// Mirror the meter to the console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<bool>,
    /// Container into which the widgets are created.
    #[serde(skip)]
    pub st_container: Option<Arc<dyn Container>>,
}

impl Config {
    /// Creates an empty configuration, inheriting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a JSON value.
    ///
    /// Fails with [`Error::InvalidConfigKind`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        let found = match &value {
            Value::Object(_) => return Ok(serde_json::from_value(value)?),
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
        };
        Err(Error::InvalidConfigKind { found })
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Returns `true` when no option is set.
    pub fn is_empty(&self) -> bool {
        self.desc.is_none()
            && self.leave.is_none()
            && self.ncols.is_none()
            && self.disable.is_none()
            && self.bar_format.is_none()
            && self.delay.is_none()
            && self.frontend.is_none()
            && self.backend.is_none()
            && self.st_container.is_none()
    }

    /// Overlays `over` on top of `self`.
    ///
    /// Options set in `over` win; options it leaves unset pass through from
    /// `self`. Neither operand is modified.
    pub fn merge(&self, over: &Config) -> Config {
        Config {
            desc: over.desc.clone().or_else(|| self.desc.clone()),
            leave: over.leave.or(self.leave),
            ncols: over.ncols.or(self.ncols),
            disable: over.disable.or(self.disable),
            bar_format: over.bar_format.clone().or_else(|| self.bar_format.clone()),
            delay: over.delay.or(self.delay),
            frontend: over.frontend.or(self.frontend),
            backend: over.backend.or(self.backend),
            st_container: over
                .st_container
                .clone()
                .or_else(|| self.st_container.clone()),
        }
    }

    /// Set the description.
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Set whether the widgets stay visible after completion.
    pub fn leave(mut self, leave: bool) -> Self {
        self.leave = Some(leave);
        self
    }

    /// Set the console width hint.
    pub fn ncols(mut self, ncols: usize) -> Self {
        self.ncols = Some(ncols);
        self
    }

    /// Disable every update.
    pub fn disable(mut self, disable: bool) -> Self {
        self.disable = Some(disable);
        self
    }

    /// Set the bar format template.
    pub fn bar_format(mut self, bar_format: impl Into<String>) -> Self {
        self.bar_format = Some(bar_format.into());
        self
    }

    /// Set the delay before the first display.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Enable or disable UI widget rendering.
    pub fn frontend(mut self, frontend: bool) -> Self {
        self.frontend = Some(frontend);
        self
    }

    /// Enable or disable the console mirror.
    pub fn backend(mut self, backend: bool) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the container receiving the widgets.
    pub fn st_container(mut self, container: Arc<dyn Container>) -> Self {
        self.st_container = Some(container);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("desc", &self.desc)
            .field("leave", &self.leave)
            .field("ncols", &self.ncols)
            .field("disable", &self.disable)
            .field("bar_format", &self.bar_format)
            .field("delay", &self.delay)
            .field("frontend", &self.frontend)
            .field("backend", &self.backend)
            .field("st_container", &self.st_container.is_some())
            .finish()
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        let same_container = match (&self.st_container, &other.st_container) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_container
            && self.desc == other.desc
            && self.leave == other.leave
            && self.ncols == other.ncols
            && self.disable == other.disable
            && self.bar_format == other.bar_format
            && self.delay == other.delay
            && self.frontend == other.frontend
            && self.backend == other.backend
    }
}

/// Serializes an optional [`Duration`] as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_f64(d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        secs.map(|s| {
            Duration::try_from_secs_f64(s).map_err(|e| serde::de::Error::custom(format!("delay: {e}")))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_right_biased() {
        let low = Config::new().desc("low").leave(true);
        let high = Config::new().desc("high").backend(true);
        let merged = low.merge(&high);
        assert_eq!(merged.desc.as_deref(), Some("high"));
        assert_eq!(merged.leave, Some(true));
        assert_eq!(merged.backend, Some(true));
        assert_eq!(low.desc.as_deref(), Some("low"));
    }

    #[test]
    fn from_value_rejects_non_mappings() {
        for value in [json!([1, 2]), json!("desc"), json!(3), json!(null), json!(true)] {
            let err = Config::from_value(value).unwrap_err();
            assert!(matches!(err, Error::InvalidConfigKind { .. }));
        }
    }

    #[test]
    fn from_value_reads_known_keys() {
        let config = Config::from_value(json!({
            "desc": "hello",
            "leave": false,
            "ncols": 0,
            "delay": 1.5,
            "frontend": true,
            "bar_format": null,
        }))
        .unwrap();
        assert_eq!(config.desc.as_deref(), Some("hello"));
        assert_eq!(config.leave, Some(false));
        assert_eq!(config.ncols, Some(0));
        assert_eq!(config.delay, Some(Duration::from_millis(1500)));
        assert_eq!(config.frontend, Some(true));
        assert_eq!(config.bar_format, None);
    }

    #[test]
    fn from_value_rejects_unknown_keys() {
        let err = Config::from_value(json!({"colour": "red"})).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn empty_config_is_empty() {
        assert!(Config::new().is_empty());
        assert!(!Config::new().disable(false).is_empty());
    }
}
