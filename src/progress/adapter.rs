//! The progress indicator and its builder.

use super::decision::RenderDecision;
use super::display::WidgetHook;
use crate::config::Config;
use crate::meter::{
    Clock, ConsoleHook, ConsoleTarget, FormatDict, Meter, MeterOptions, PositionRegistry,
    SystemClock,
};
use crate::scope::ScopeManager;
use crate::ui::{Container, MemoryContainer};

use indicatif::ProgressBar;
use std::iter::Empty;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A progress indicator with no underlying iterator, advanced by
/// [`StProgress::update`].
pub type Counter = StProgress<Empty<()>>;

/// An iterator adapter rendering its progress into UI widgets.
///
/// Iterating yields the items of the wrapped iterator unchanged. Each step
/// advances the meter, and every refresh its throttling allows is rendered
/// into the configured container and, if enabled, the console.
///
/// The indicator closes when the iterator is exhausted or when it is
/// dropped, whichever comes first, so leaving a loop early with `break`, `?`
/// or a panic still clears its widgets.
///
/// ```rust
/// use std::sync::Arc;
/// use stprogress::{ScopeManager, StProgress};
/// use stprogress::ui::MemoryContainer;
///
/// let container = MemoryContainer::new();
/// let items = StProgress::builder(0..10)
///     .st_container(Arc::new(container.clone()))
///     .scope_manager(Arc::new(ScopeManager::default()))
///     .leave(true)
///     .build();
/// let sum: u32 = items.sum();
///
/// assert_eq!(sum, 45);
/// assert_eq!(container.len(), 1);
/// ```
#[derive(Debug)]
pub struct StProgress<I> {
    iter: Option<I>,
    meter: Meter<WidgetHook>,
    yielded: bool,
}

impl<I: Iterator> StProgress<I> {
    /// Wraps `iter` with the resolved default configuration.
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self::builder(iter).build()
    }

    /// Starts configuring a progress indicator over `iter`.
    pub fn builder(iter: impl IntoIterator<IntoIter = I>) -> ProgressBuilder<I> {
        ProgressBuilder::new(iter.into_iter())
    }
}

impl StProgress<Empty<()>> {
    /// Starts configuring a manual counter.
    pub fn counter() -> ProgressBuilder<Empty<()>> {
        ProgressBuilder::counter()
    }
}

impl<I> StProgress<I> {
    /// Advances the position by `n`, refreshing if due.
    pub fn update(&mut self, n: u64) -> bool {
        self.meter.update(n)
    }

    /// Forces a refresh of the current state.
    pub fn refresh(&mut self) {
        self.meter.refresh();
    }

    /// Restarts from zero, optionally with a new total.
    pub fn reset(&mut self, total: Option<u64>) {
        self.meter.reset(total);
    }

    /// Changes the description and refreshes.
    pub fn set_description(&mut self, desc: impl Into<String>) {
        self.meter.set_description(desc, true);
    }

    /// Changes the text appended after the rate and refreshes.
    pub fn set_postfix(&mut self, postfix: impl Into<String>) {
        self.meter.set_postfix(postfix, true);
    }

    /// Closes the indicator, clearing its widgets unless it should stay.
    ///
    /// Does nothing if already closed or disabled.
    pub fn close(&mut self) {
        self.meter.close();
    }

    /// Current position.
    pub fn n(&self) -> u64 {
        self.meter.state().n()
    }

    /// Expected number of iterations.
    pub fn total(&self) -> Option<u64> {
        self.meter.state().total()
    }

    /// Display slot among the active indicators.
    pub fn pos(&self) -> usize {
        self.meter.state().pos()
    }

    /// Whether displays are suppressed, by option or because it is closed.
    pub fn is_disabled(&self) -> bool {
        self.meter.state().is_disabled()
    }

    /// Options the meter runs with.
    pub fn options(&self) -> &MeterOptions {
        self.meter.state().options()
    }

    /// Snapshot of the values rendered in the meter text.
    pub fn format_dict(&self) -> FormatDict {
        self.meter.state().format_dict()
    }

    /// The meter text for the current state.
    pub fn format_meter(&self) -> String {
        self.meter.state().format_meter()
    }

    /// Whether the bar format asked for a progress bar.
    pub fn should_display_progress_bar(&self) -> bool {
        self.meter.hook().should_display_progress_bar()
    }

    /// Whether the bar format left any text to display.
    pub fn should_display_text(&self) -> bool {
        self.meter.hook().should_display_text()
    }

    /// Whether the progress widget currently exists.
    pub fn has_progress_widget(&self) -> bool {
        self.meter.hook().has_progress_widget()
    }

    /// Whether the text widget currently exists.
    pub fn has_text_widget(&self) -> bool {
        self.meter.hook().has_text_widget()
    }

    /// The console line, when the console mirror is enabled.
    pub fn console_bar(&self) -> Option<&ProgressBar> {
        self.meter.hook().console_bar()
    }
}

impl<I: Iterator> Iterator for StProgress<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let iter = self.iter.as_mut()?;
        // The previous item was processed by the caller by now.
        if self.yielded {
            self.meter.update(1);
        }
        match iter.next() {
            Some(item) => {
                self.yielded = true;
                Some(item)
            }
            None => {
                self.yielded = false;
                self.meter.close();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter
            .as_ref()
            .map_or((0, Some(0)), Iterator::size_hint)
    }
}

/// A builder used to create a [`StProgress`].
///
/// Options set here form the call-site configuration: they take precedence
/// over the innermost active scope, which itself takes precedence over the
/// default configuration of the [`ScopeManager`].
///
/// ```rust
/// use std::time::Duration;
/// use stprogress::StProgress;
///
/// let mut counter = StProgress::counter()
///     .total(50)
///     .desc("Downloading")
///     .mininterval(Duration::ZERO)
///     .build();
/// counter.update(10);
/// assert_eq!(counter.n(), 10);
/// ```
pub struct ProgressBuilder<I> {
    iter: Option<I>,
    config: Config,
    meter: MeterOptions,
    console_target: ConsoleTarget,
    manager: Option<Arc<ScopeManager>>,
    clock: Option<Arc<dyn Clock>>,
    registry: Option<Arc<PositionRegistry>>,
}

impl<I: Iterator> ProgressBuilder<I> {
    /// Creates a builder over `iter`.
    pub fn new(iter: I) -> Self {
        Self::with_iter(Some(iter))
    }
}

impl ProgressBuilder<Empty<()>> {
    /// Creates a builder for a manual counter.
    pub fn counter() -> Self {
        Self::with_iter(None)
    }
}

impl<I> ProgressBuilder<I> {
    fn with_iter(iter: Option<I>) -> Self {
        Self {
            iter,
            config: Config::default(),
            meter: MeterOptions::default(),
            console_target: ConsoleTarget::default(),
            manager: None,
            clock: None,
            registry: None,
        }
    }

    /// Replaces the whole call-site configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the description.
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.config.desc = Some(desc.into());
        self
    }

    /// Set whether the widgets stay visible once complete.
    pub fn leave(mut self, leave: bool) -> Self {
        self.config.leave = Some(leave);
        self
    }

    /// Set the console width hint. `0` renders no literal bar.
    pub fn ncols(mut self, ncols: usize) -> Self {
        self.config.ncols = Some(ncols);
        self
    }

    /// Disable every display.
    pub fn disable(mut self, disable: bool) -> Self {
        self.config.disable = Some(disable);
        self
    }

    /// Set the bar format template.
    pub fn bar_format(mut self, bar_format: impl Into<String>) -> Self {
        self.config.bar_format = Some(bar_format.into());
        self
    }

    /// Set the delay before the first display.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = Some(delay);
        self
    }

    /// Enable or disable rendering into the UI widgets.
    pub fn frontend(mut self, frontend: bool) -> Self {
        self.config.frontend = Some(frontend);
        self
    }

    /// Enable or disable the console mirror.
    pub fn backend(mut self, backend: bool) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Set the container in which widgets are created.
    pub fn st_container(mut self, container: Arc<dyn Container>) -> Self {
        self.config.st_container = Some(container);
        self
    }

    /// Set the expected number of iterations.
    ///
    /// Defaults to the exact length of the iterator when it reports one.
    pub fn total(mut self, total: u64) -> Self {
        self.meter.total = Some(total);
        self
    }

    /// Set the starting position.
    pub fn initial(mut self, initial: u64) -> Self {
        self.meter.initial = initial;
        self
    }

    /// Set the minimum time between two refreshes.
    pub fn mininterval(mut self, mininterval: Duration) -> Self {
        self.meter.mininterval = mininterval;
        self
    }

    /// Set the minimum number of iterations between two refreshes.
    pub fn miniters(mut self, miniters: u64) -> Self {
        self.meter.miniters = miniters;
        self
    }

    /// Set the unit of one iteration.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.meter.unit = unit.into();
        self
    }

    /// Scale numbers with SI prefixes, dividing by `divisor` at each step.
    pub fn unit_scale(mut self, divisor: f64) -> Self {
        self.meter.unit_scale = true;
        self.meter.unit_divisor = divisor;
        self
    }

    /// Set the rate smoothing factor, in `[0, 1]`.
    pub fn smoothing(mut self, smoothing: f64) -> Self {
        self.meter.smoothing = smoothing;
        self
    }

    /// Set a fixed display position.
    pub fn position(mut self, position: usize) -> Self {
        self.meter.position = Some(position);
        self
    }

    /// Set the text appended after the rate.
    pub fn postfix(mut self, postfix: impl Into<String>) -> Self {
        self.meter.postfix = Some(postfix.into());
        self
    }

    /// Set where the console mirror is drawn.
    pub fn console_target(mut self, target: ConsoleTarget) -> Self {
        self.console_target = target;
        self
    }

    /// Resolve the configuration against `manager` instead of the global one.
    pub fn scope_manager(mut self, manager: Arc<ScopeManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Measure time with `clock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Allocate the display position from `registry`.
    pub fn position_registry(mut self, registry: Arc<PositionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolves the configuration and creates the [`StProgress`].
    pub fn build(self) -> StProgress<I>
    where
        I: Iterator,
    {
        let manager = self
            .manager
            .unwrap_or_else(|| ScopeManager::global().clone());
        let resolved = manager.use_current_default_if_config_not_provided(&self.config);

        let container = resolved
            .st_container
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryContainer::new()));
        let backend = resolved.backend.unwrap_or(false);
        let frontend = resolved.frontend.unwrap_or(true);

        // Widgets draw the bar, so the console meter does not unless asked to.
        let ncols = match (resolved.ncols, &resolved.bar_format) {
            (None, None) => Some(0),
            (ncols, _) => ncols,
        };
        let decision = RenderDecision::decide(resolved.bar_format.as_deref());

        let mut meter = self.meter;
        meter.desc = resolved.desc.unwrap_or_default();
        meter.leave = resolved.leave;
        meter.ncols = ncols;
        meter.bar_format = decision.bar_format.clone();
        meter.disable = resolved.disable.unwrap_or(false);
        meter.delay = resolved.delay.unwrap_or(Duration::ZERO);
        if meter.total.is_none() {
            meter.total = self.iter.as_ref().and_then(|iter| match iter.size_hint() {
                (lower, Some(upper)) if lower == upper => Some(upper as u64),
                _ => None,
            });
        }

        debug!(
            desc = %meter.desc,
            total = ?meter.total,
            frontend,
            backend,
            show_bar = decision.show_bar,
            show_text = decision.show_text,
            "Creating progress indicator"
        );

        let console = backend.then(|| ConsoleHook::new(self.console_target));
        let hook = WidgetHook::new(container, frontend, console, &decision);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::default()));
        let registry = self.registry.unwrap_or_else(PositionRegistry::global);

        StProgress {
            iter: self.iter,
            meter: Meter::with_clock(meter, hook, clock, registry),
            yielded: false,
        }
    }
}

/// Extension trait to attach a progress indicator to any iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Wraps the iterator with the resolved default configuration.
    fn st_progress(self) -> StProgress<Self> {
        StProgress::new(self)
    }

    /// Starts configuring a progress indicator over the iterator.
    fn st_progress_builder(self) -> ProgressBuilder<Self> {
        ProgressBuilder::new(self)
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}

/// Replaces the default configuration of the global [`ScopeManager`].
pub fn set_default_config(config: Config) {
    ScopeManager::global().set_default_config(config);
}

/// Returns the default configuration of the global [`ScopeManager`].
pub fn get_default_config() -> Config {
    ScopeManager::global().get_default_config()
}

/// Pushes a scope on the global [`ScopeManager`] until the guard is dropped.
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub fn scope(config: Config) -> crate::scope::ScopeGuard<'static> {
    ScopeManager::global().scope(config)
}

/// Runs `f` inside a scope of the global [`ScopeManager`].
pub fn with_scope<T>(config: Config, f: impl FnOnce(&Config) -> T) -> T {
    ScopeManager::global().with_scope(config, f)
}
