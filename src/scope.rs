//! Layered configuration store.
//!
//! A [`ScopeManager`] holds one default [`Config`] and a stack of scoped
//! overrides. The effective configuration of a progress indicator is
//!
//! ```text
//! default ⊕ innermost scope ⊕ call site
//! ```
//!
//! where `⊕` is [`Config::merge`]. Intermediate scopes are shadowed by the
//! innermost one and are not consulted.
//!
//! # Examples
//!
//! ```rust
//! use stprogress::{Config, ScopeManager};
//!
//! let manager = ScopeManager::new(Config::new().desc("hello"));
//! {
//!     let _outer = manager.scope(Config::new().frontend(false));
//!     let _inner = manager.scope(Config::new());
//!     // The outer scope is shadowed by the (empty) inner one.
//!     let resolved = manager.use_current_default_if_config_not_provided(&Config::new());
//!     assert_eq!(resolved, Config::new().desc("hello"));
//! }
//! assert_eq!(manager.depth(), 0);
//! ```

use crate::config::Config;
use crate::Result;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

static GLOBAL: OnceLock<Arc<ScopeManager>> = OnceLock::new();

/// Default configuration plus a stack of scoped overrides.
#[derive(Debug, Default)]
pub struct ScopeManager {
    default_config: RwLock<Config>,
    scope_stack: Mutex<Vec<Config>>,
}

impl ScopeManager {
    /// Creates a manager with the given default configuration and no scope.
    pub fn new(default_config: Config) -> Self {
        Self {
            default_config: RwLock::new(default_config),
            scope_stack: Mutex::new(Vec::new()),
        }
    }

    /// Creates a manager whose default configuration is read from a JSON value.
    ///
    /// Fails with [`Error::InvalidConfigKind`](crate::Error::InvalidConfigKind)
    /// if the value is not a mapping.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(Self::new(Config::from_value(value)?))
    }

    /// Creates a manager whose default configuration is read from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading default progress configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(Config::from_json_str(&raw)?))
    }

    /// The manager shared by every progress indicator that was not given one.
    ///
    /// Hosts serving several sessions concurrently should create one manager
    /// per session instead, and hand it to
    /// [`ProgressBuilder::scope_manager`](crate::ProgressBuilder::scope_manager).
    pub fn global() -> &'static Arc<ScopeManager> {
        GLOBAL.get_or_init(|| Arc::new(ScopeManager::default()))
    }

    /// Returns a copy of the default configuration.
    pub fn get_default_config(&self) -> Config {
        self.default_config.read().clone()
    }

    /// Replaces the default configuration wholesale.
    pub fn set_default_config(&self, config: Config) {
        debug!(?config, "Setting default progress configuration");
        *self.default_config.write() = config;
    }

    /// Pushes `config` until the returned guard is dropped.
    ///
    /// The guard restores the stack depth it found on entry, whichever way
    /// the enclosing block is left.
    #[must_use = "the scope is popped as soon as the guard is dropped"]
    pub fn scope(&self, config: Config) -> ScopeGuard<'_> {
        let mut stack = self.scope_stack.lock();
        let depth = stack.len();
        trace!(depth, ?config, "Entering progress scope");
        stack.push(config.clone());
        ScopeGuard {
            manager: self,
            depth,
            config,
        }
    }

    /// Runs `f` with `config` pushed as the innermost scope.
    pub fn with_scope<T>(&self, config: Config, f: impl FnOnce(&Config) -> T) -> T {
        let guard = self.scope(config);
        f(guard.config())
    }

    /// Returns the innermost scope, or an empty configuration outside any scope.
    pub fn get_current_scope_config(&self) -> Config {
        self.scope_stack.lock().last().cloned().unwrap_or_default()
    }

    /// Number of scopes currently active.
    pub fn depth(&self) -> usize {
        self.scope_stack.lock().len()
    }

    /// Resolves `config` against the default and the innermost scope.
    pub fn use_current_default_if_config_not_provided(&self, config: &Config) -> Config {
        self.get_default_config()
            .merge(&self.get_current_scope_config())
            .merge(config)
    }

    fn pop_to(&self, depth: usize) {
        let mut stack = self.scope_stack.lock();
        trace!(from = stack.len(), to = depth, "Leaving progress scope");
        stack.truncate(depth);
    }
}

/// An active scope. Dropping it pops the scope.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    manager: &'a ScopeManager,
    depth: usize,
    config: Config,
}

impl ScopeGuard<'_> {
    /// The configuration pushed by this scope.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.manager.pop_to(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_yields_empty_config() {
        let manager = ScopeManager::default();
        assert!(manager.get_current_scope_config().is_empty());
    }

    #[test]
    fn guard_exposes_pushed_config() {
        let manager = ScopeManager::default();
        let guard = manager.scope(Config::new().desc("scoped"));
        assert_eq!(guard.config().desc.as_deref(), Some("scoped"));
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn with_scope_returns_closure_value() {
        let manager = ScopeManager::default();
        let desc = manager.with_scope(Config::new().desc("inside"), |_| {
            manager
                .use_current_default_if_config_not_provided(&Config::new())
                .desc
        });
        assert_eq!(desc.as_deref(), Some("inside"));
        assert_eq!(manager.depth(), 0);
    }

    #[test]
    fn outer_guard_dropped_first_truncates_inner() {
        let manager = ScopeManager::default();
        let outer = manager.scope(Config::new().desc("outer"));
        let inner = manager.scope(Config::new().desc("inner"));
        drop(outer);
        assert_eq!(manager.depth(), 0);
        drop(inner);
        assert_eq!(manager.depth(), 0);
    }
}
