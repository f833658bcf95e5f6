//! Stprogress renders the progress of iterations into the widgets of a UI
//! host, optionally mirroring it to a console line.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stprogress::{Config, ProgressIteratorExt, ScopeManager};
//! use stprogress::ui::MemoryContainer;
//!
//! let manager = Arc::new(ScopeManager::new(Config::new().desc("Working")));
//! let container = MemoryContainer::new();
//!
//! for _ in (0..10)
//!     .st_progress_builder()
//!     .scope_manager(manager.clone())
//!     .st_container(Arc::new(container.clone()))
//!     .build()
//! {
//!     // ...
//! }
//!
//! // The outermost indicator stays visible once complete.
//! assert_eq!(container.len(), 1);
//! ```
//!
//! # Configuration layers
//!
//! Every option is resolved from three layers, the later winning:
//!
//! 1. the default configuration of the [`ScopeManager`];
//! 2. the innermost active scope, see [`ScopeManager::scope`];
//! 3. the options given to the [`ProgressBuilder`].
//!
//! # Module Organization
//!
//! - [`config`] - The layered [`Config`] record
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`meter`] - Iteration counting, throttling and meter text rendering
//! - [`progress`] - The UI progress indicator and its builder
//! - [`scope`] - Default configuration and scoped overrides
//! - [`ui`] - Host UI abstraction and an in-memory host

pub mod config;
pub mod error;
pub mod meter;
pub mod progress;
pub mod scope;
pub mod ui;

pub use config::Config;
pub use error::{Error, Result};
pub use meter::{format_meter, ConsoleTarget, FormatDict};
pub use progress::{
    get_default_config, scope, set_default_config, with_scope, Counter, ProgressBuilder,
    ProgressIteratorExt, RenderDecision, StProgress,
};
pub use scope::{ScopeGuard, ScopeManager};
pub use ui::{Container, HostCapabilities, Widget};
