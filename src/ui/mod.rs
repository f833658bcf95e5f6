//! Host UI widget primitives.
//!
//! A reactive UI host exposes containers in which placeholder widgets can be
//! created. A placeholder shows one element at a time: writing to it, or
//! setting it to a progress bar, replaces whatever it showed before.
//!
//! # Overview
//!
//! - [`Container`] creates placeholders and reports the host's capabilities.
//! - [`Widget`] is one placeholder.
//! - [`HostCapabilities`] tells which rendering strategy the host supports.
//! - [`MemoryContainer`] is a host that keeps its elements in memory, useful
//!   to serve a session's element tree or to inspect what was rendered.

mod memory;

pub use memory::{Element, MemoryContainer, MemoryWidget, WidgetCall, WidgetRecord};

use semver::Version;
use std::fmt::Debug;

/// A host container in which widgets are created.
pub trait Container: Debug + Send + Sync {
    /// Creates an empty placeholder widget at the end of the container.
    fn empty(&self) -> Box<dyn Widget>;

    /// What the host can render.
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::latest()
    }
}

/// A placeholder widget.
pub trait Widget: Debug + Send {
    /// Shows a progress bar filled to `fraction`, with an optional inline text.
    ///
    /// Hosts without inline text support ignore `text`.
    fn progress(&mut self, fraction: f64, text: Option<&str>);

    /// Shows `text`.
    fn write(&mut self, text: &str);

    /// Clears the displayed content.
    fn empty(&mut self);
}

/// Rendering features that depend on the host version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// The progress widget can display a text next to the bar.
    pub inline_progress_text: bool,
}

impl HostCapabilities {
    /// First host version rendering text inside the progress widget.
    pub const INLINE_PROGRESS_TEXT_SINCE: Version = Version::new(1, 18, 0);

    /// Capabilities of the given host version.
    ///
    /// ```rust
    /// use semver::Version;
    /// use stprogress::ui::HostCapabilities;
    ///
    /// assert!(!HostCapabilities::for_version(&Version::new(1, 17, 2)).inline_progress_text);
    /// assert!(HostCapabilities::for_version(&Version::new(1, 18, 0)).inline_progress_text);
    /// ```
    pub fn for_version(version: &Version) -> Self {
        Self {
            inline_progress_text: *version >= Self::INLINE_PROGRESS_TEXT_SINCE,
        }
    }

    /// Capabilities of current hosts.
    pub fn latest() -> Self {
        Self {
            inline_progress_text: true,
        }
    }

    /// Capabilities of hosts predating inline progress text.
    pub fn legacy() -> Self {
        Self {
            inline_progress_text: false,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::latest()
    }
}
