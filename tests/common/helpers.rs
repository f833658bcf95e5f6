#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use stprogress::meter::{ManualClock, PositionRegistry};
use stprogress::ui::{HostCapabilities, MemoryContainer, WidgetRecord};
use stprogress::{Config, ProgressBuilder, ScopeManager};

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`, once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// === Filesystem Helpers ===

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

// === Progress Helpers ===

/// Everything a test needs to drive a progress indicator deterministically
pub struct Harness {
    pub container: MemoryContainer,
    pub manager: Arc<ScopeManager>,
    pub clock: ManualClock,
    pub registry: Arc<PositionRegistry>,
}

impl Harness {
    /// Creates a harness on a host with inline progress text
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::latest())
    }

    /// Creates a harness on a host without inline progress text
    pub fn legacy() -> Self {
        Self::with_capabilities(HostCapabilities::legacy())
    }

    fn with_capabilities(capabilities: HostCapabilities) -> Self {
        init_tracing();
        Self {
            container: MemoryContainer::with_capabilities(capabilities),
            manager: Arc::new(ScopeManager::default()),
            clock: ManualClock::new(),
            registry: Arc::new(PositionRegistry::new()),
        }
    }

    /// Creates a harness whose manager uses `default_config`
    pub fn with_default(default_config: Config) -> Self {
        let harness = Self::new();
        harness.manager.set_default_config(default_config);
        harness
    }

    /// A builder refreshing on every iteration, wired to this harness
    pub fn builder<I: Iterator>(&self, iter: I) -> ProgressBuilder<I> {
        ProgressBuilder::new(iter)
            .st_container(Arc::new(self.container.clone()))
            .scope_manager(self.manager.clone())
            .clock(Arc::new(self.clock.clone()))
            .position_registry(self.registry.clone())
            .mininterval(Duration::ZERO)
    }

    /// A counter refreshing on every update, wired to this harness
    pub fn counter(&self) -> ProgressBuilder<std::iter::Empty<()>> {
        ProgressBuilder::counter()
            .st_container(Arc::new(self.container.clone()))
            .scope_manager(self.manager.clone())
            .clock(Arc::new(self.clock.clone()))
            .position_registry(self.registry.clone())
            .mininterval(Duration::ZERO)
    }

    /// Copy of the `index`-th widget created
    pub fn widget(&self, index: usize) -> WidgetRecord {
        self.container
            .widget(index)
            .unwrap_or_else(|| panic!("widget {} was never created", index))
    }
}

// === Assertion Helpers ===

/// Asserts that every widget was emptied once and released
pub fn assert_all_cleared(container: &MemoryContainer) {
    for (index, record) in container.widgets().iter().enumerate() {
        assert_eq!(record.empty_count(), 1, "widget {} should be emptied once", index);
        assert!(record.dropped, "widget {} should be released", index);
        assert!(record.element.is_none(), "widget {} should show nothing", index);
    }
}

/// Asserts that no widget was emptied
pub fn assert_none_cleared(container: &MemoryContainer) {
    for (index, record) in container.widgets().iter().enumerate() {
        assert_eq!(record.empty_count(), 0, "widget {} should not be emptied", index);
    }
}
