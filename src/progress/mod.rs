//! Progress indicators rendered into UI widgets.
//!
//! This module ties the configuration layers, the meter and the host UI
//! together. A [`StProgress`] resolves its configuration through a
//! [`ScopeManager`](crate::ScopeManager), decides from the bar format which
//! widgets it needs, and renders every refresh of its meter into them.
//!
//! # Overview
//!
//! - `decision` - which widgets a bar format asks for ([`RenderDecision`])
//! - `display` - rendering refreshes into widgets ([`WidgetHook`])
//! - `adapter` - the iterator adapter and its builder ([`StProgress`], [`ProgressBuilder`])
//!
//! # Examples
//!
//! ## Wrapping an iterator
//!
//! ```rust
//! use std::sync::Arc;
//! use stprogress::{ProgressIteratorExt, ScopeManager};
//! use stprogress::ui::MemoryContainer;
//!
//! let container = MemoryContainer::new();
//! let doubled: Vec<u32> = (1..=3)
//!     .st_progress_builder()
//!     .st_container(Arc::new(container.clone()))
//!     .scope_manager(Arc::new(ScopeManager::default()))
//!     .desc("Doubling")
//!     .build()
//!     .map(|x| x * 2)
//!     .collect();
//!
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```
//!
//! ## Text only
//!
//! ```rust
//! use std::sync::Arc;
//! use stprogress::{ScopeManager, StProgress};
//! use stprogress::ui::MemoryContainer;
//!
//! let container = MemoryContainer::new();
//! let bar = StProgress::builder(0..5)
//!     .st_container(Arc::new(container.clone()))
//!     .scope_manager(Arc::new(ScopeManager::default()))
//!     .bar_format("{desc}: {n_fmt}/{total_fmt}")
//!     .build();
//!
//! assert!(!bar.should_display_progress_bar());
//! assert!(bar.should_display_text());
//! ```

mod adapter;
mod decision;
mod display;

pub use adapter::{
    get_default_config, scope, set_default_config, with_scope, Counter, ProgressBuilder,
    ProgressIteratorExt, StProgress,
};
pub use decision::RenderDecision;
pub use display::WidgetHook;
