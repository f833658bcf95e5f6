//! The iteration meter: position, rate and throttled refreshes.
//!
//! A [`Meter`] counts iterations and decides when a refresh is due. It does
//! not draw anything itself: every refresh is handed to a [`DisplayHook`]
//! injected at construction, which may render to a console line
//! ([`ConsoleHook`]), to UI widgets, or both.
//!
//! # Overview
//!
//! - `format` - meter text rendering ([`format_meter`] and helpers)
//! - `clock` - time sources ([`SystemClock`], [`ManualClock`])
//! - `position` - display slots of nested meters ([`PositionRegistry`])
//! - `console` - the console display hook ([`ConsoleHook`])
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use stprogress::meter::{ManualClock, Meter, MeterOptions, PositionRegistry};
//!
//! let clock = ManualClock::new();
//! let options = MeterOptions {
//!     total: Some(4),
//!     mininterval: Duration::ZERO,
//!     ncols: Some(0),
//!     ..MeterOptions::default()
//! };
//! let mut meter = Meter::with_clock(options, (), Arc::new(clock.clone()), Arc::new(PositionRegistry::new()));
//!
//! clock.advance(Duration::from_secs(1));
//! assert!(meter.update(1));
//! assert_eq!(meter.state().format_meter(), " 25% 1/4 [00:01<00:03,  1.00it/s]");
//! meter.close();
//! ```

mod clock;
mod console;
mod format;
mod position;

pub use clock::{Clock, ManualClock, SystemClock};
pub use console::{ConsoleHook, ConsoleTarget};
pub use format::{format_interval, format_meter, format_sizeof, FormatDict};
pub use position::PositionRegistry;

use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Receives the refreshes of a [`Meter`].
pub trait DisplayHook {
    /// Called whenever the meter's throttling policy allows a refresh.
    fn display(&mut self, state: &MeterState);

    /// Called once when the meter closes, after the final display.
    ///
    /// `leave` tells whether the indicator should stay visible.
    fn close(&mut self, state: &MeterState, leave: bool);
}

/// A hook that displays nothing.
impl DisplayHook for () {
    fn display(&mut self, _state: &MeterState) {}

    fn close(&mut self, _state: &MeterState, _leave: bool) {}
}

/// Options of a [`Meter`].
#[derive(Debug, Clone)]
pub struct MeterOptions {
    /// Expected number of iterations.
    pub total: Option<u64>,
    /// Starting position.
    pub initial: u64,
    /// Description prefixed to the meter text.
    pub desc: String,
    /// Keep the indicator once closed. `None` keeps only the outermost one.
    pub leave: Option<bool>,
    /// Width hint. `Some(0)` renders without a literal bar.
    pub ncols: Option<usize>,
    /// Custom template.
    pub bar_format: Option<String>,
    /// Count silently without ever displaying.
    pub disable: bool,
    /// Minimum elapsed time before the first display.
    pub delay: Duration,
    /// Minimum time between two displays.
    pub mininterval: Duration,
    /// Minimum number of iterations between two displays.
    pub miniters: u64,
    /// Unit of one iteration.
    pub unit: String,
    /// Scale numbers with SI prefixes.
    pub unit_scale: bool,
    /// Divisor used when scaling.
    pub unit_divisor: f64,
    /// Weight of the latest sample in the rate's moving average, in `[0, 1]`.
    /// `0` uses the overall average.
    pub smoothing: f64,
    /// Fixed display position instead of the lowest free one.
    pub position: Option<usize>,
    /// Text appended after the rate.
    pub postfix: Option<String>,
}

impl Default for MeterOptions {
    fn default() -> Self {
        Self {
            total: None,
            initial: 0,
            desc: String::new(),
            leave: None,
            ncols: None,
            bar_format: None,
            disable: false,
            delay: Duration::ZERO,
            mininterval: Duration::from_millis(100),
            miniters: 0,
            unit: "it".into(),
            unit_scale: false,
            unit_divisor: 1000.0,
            smoothing: 0.3,
            position: None,
            postfix: None,
        }
    }
}

/// Exponential moving average, debiased for its first samples.
#[derive(Debug, Clone, Default)]
struct Ema {
    alpha: f64,
    last: f64,
    calls: i32,
}

impl Ema {
    fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    fn push(&mut self, x: f64) {
        self.last = self.alpha * x + (1.0 - self.alpha) * self.last;
        self.calls += 1;
    }

    fn value(&self) -> Option<f64> {
        if self.calls == 0 || self.alpha <= 0.0 {
            return None;
        }
        Some(self.last / (1.0 - (1.0 - self.alpha).powi(self.calls)))
    }
}

/// Counters of a [`Meter`], as seen by its [`DisplayHook`].
#[derive(Debug)]
pub struct MeterState {
    options: MeterOptions,
    clock: Arc<dyn Clock>,
    n: u64,
    pos: usize,
    start_t: Duration,
    last_print_n: u64,
    last_print_t: Duration,
    ema_dn: Ema,
    ema_dt: Ema,
    disabled: bool,
}

impl MeterState {
    /// Current position.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Expected number of iterations.
    pub fn total(&self) -> Option<u64> {
        self.options.total
    }

    /// Display slot of this meter among the active ones.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Description.
    pub fn desc(&self) -> &str {
        &self.options.desc
    }

    /// Options the meter runs with.
    pub fn options(&self) -> &MeterOptions {
        &self.options
    }

    /// Whether displays are suppressed, either by option or because the
    /// meter is closed.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Time since the meter started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start_t)
    }

    /// Whether the indicator should stay visible once closed.
    pub fn leave(&self) -> bool {
        self.options.leave.unwrap_or(self.pos == 0)
    }

    /// Snapshot of the values used to render the meter text.
    pub fn format_dict(&self) -> FormatDict {
        let rate = match (self.ema_dn.value(), self.ema_dt.value()) {
            (Some(dn), Some(dt)) if dt > 0.0 => Some(dn / dt),
            _ => None,
        };
        FormatDict {
            n: self.n,
            total: self.options.total,
            elapsed: self.elapsed(),
            ncols: self.options.ncols,
            prefix: self.options.desc.clone(),
            unit: self.options.unit.clone(),
            unit_scale: self.options.unit_scale,
            unit_divisor: self.options.unit_divisor,
            rate,
            bar_format: self.options.bar_format.clone(),
            postfix: self.options.postfix.clone(),
            initial: self.options.initial,
        }
    }

    /// Renders the current meter text.
    pub fn format_meter(&self) -> String {
        format_meter(&self.format_dict())
    }

    fn has_displayed(&self) -> bool {
        self.last_print_t >= self.start_t + self.options.delay
    }
}

/// Iteration counter with throttled refreshes.
#[derive(Debug)]
pub struct Meter<H: DisplayHook> {
    state: MeterState,
    hook: H,
    registry: Arc<PositionRegistry>,
    owns_position: bool,
}

impl<H: DisplayHook> Meter<H> {
    /// Creates a meter on the system clock and the global position registry.
    pub fn new(options: MeterOptions, hook: H) -> Self {
        Self::with_clock(
            options,
            hook,
            Arc::new(SystemClock::default()),
            PositionRegistry::global(),
        )
    }

    /// Creates a meter with an explicit clock and position registry.
    ///
    /// Unless the meter is disabled or delayed, the initial state is
    /// displayed right away.
    pub fn with_clock(
        options: MeterOptions,
        hook: H,
        clock: Arc<dyn Clock>,
        registry: Arc<PositionRegistry>,
    ) -> Self {
        let disabled = options.disable;
        let (pos, owns_position) = match (disabled, options.position) {
            (true, p) => (p.unwrap_or(0), false),
            (false, Some(p)) => (p, registry.claim(p)),
            (false, None) => (registry.acquire(), true),
        };
        let now = clock.now();
        let n = options.initial;
        let delay = options.delay;

        let mut meter = Self {
            state: MeterState {
                ema_dn: Ema::new(options.smoothing),
                ema_dt: Ema::new(options.smoothing),
                options,
                clock,
                n,
                pos,
                start_t: now,
                last_print_n: n,
                last_print_t: now,
                disabled,
            },
            hook,
            registry,
            owns_position,
        };
        trace!(pos, disabled, "Meter created");

        if !disabled && delay.is_zero() {
            meter.refresh();
        }
        meter
    }

    /// Advances the position by `n` and refreshes if the throttling policy
    /// allows it. Returns whether a refresh happened.
    pub fn update(&mut self, n: u64) -> bool {
        let state = &mut self.state;
        state.n = state.n.saturating_add(n);
        if state.disabled {
            return false;
        }

        let dn = state.n - state.last_print_n;
        if dn < state.options.miniters {
            return false;
        }
        let now = state.clock.now();
        let dt = now.saturating_sub(state.last_print_t);
        if dt < state.options.mininterval || now < state.start_t + state.options.delay {
            return false;
        }

        if dn > 0 && !dt.is_zero() {
            state.ema_dn.push(dn as f64);
            state.ema_dt.push(dt.as_secs_f64());
        }
        self.display_at(now);
        true
    }

    /// Forces a display of the current state.
    pub fn refresh(&mut self) {
        if self.state.disabled {
            return;
        }
        let now = self.state.clock.now();
        self.display_at(now);
    }

    fn display_at(&mut self, now: Duration) {
        self.hook.display(&self.state);
        self.state.last_print_n = self.state.n;
        self.state.last_print_t = now;
    }

    /// Restarts counting from zero, optionally with a new total.
    pub fn reset(&mut self, total: Option<u64>) {
        let now = self.state.clock.now();
        let state = &mut self.state;
        state.n = 0;
        if total.is_some() {
            state.options.total = total;
        }
        state.start_t = now;
        state.last_print_n = 0;
        state.last_print_t = now;
        state.ema_dn = Ema::new(state.options.smoothing);
        state.ema_dt = Ema::new(state.options.smoothing);
        self.refresh();
    }

    /// Changes the description.
    pub fn set_description(&mut self, desc: impl Into<String>, refresh: bool) {
        self.state.options.desc = desc.into();
        if refresh {
            self.refresh();
        }
    }

    /// Changes the text appended after the rate.
    pub fn set_postfix(&mut self, postfix: impl Into<String>, refresh: bool) {
        self.state.options.postfix = Some(postfix.into());
        if refresh {
            self.refresh();
        }
    }

    /// Finalizes the meter and hands over to the hook's `close`.
    ///
    /// Closing twice, or closing a disabled meter, does nothing.
    pub fn close(&mut self) {
        if self.state.disabled {
            return;
        }
        self.state.disabled = true;
        if self.owns_position {
            self.registry.release(self.state.pos);
            self.owns_position = false;
        }

        let leave = self.state.leave();
        trace!(pos = self.state.pos, leave, n = self.state.n, "Meter closed");
        if leave && self.state.has_displayed() {
            self.state.ema_dn = Ema::default();
            self.state.ema_dt = Ema::default();
            self.hook.display(&self.state);
        }
        self.hook.close(&self.state, leave);
    }

    /// Counters of the meter.
    pub fn state(&self) -> &MeterState {
        &self.state
    }

    /// The display hook.
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Mutable access to the display hook.
    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }
}

impl<H: DisplayHook> Drop for Meter<H> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        displays: Vec<(u64, String)>,
        closes: Vec<bool>,
    }

    impl DisplayHook for Recorder {
        fn display(&mut self, state: &MeterState) {
            self.displays.push((state.n(), state.format_meter()));
        }

        fn close(&mut self, _state: &MeterState, leave: bool) {
            self.closes.push(leave);
        }
    }

    fn meter(options: MeterOptions, clock: &ManualClock) -> Meter<Recorder> {
        Meter::with_clock(
            options,
            Recorder::default(),
            Arc::new(clock.clone()),
            Arc::new(PositionRegistry::new()),
        )
    }

    fn every_iteration() -> MeterOptions {
        MeterOptions {
            mininterval: Duration::ZERO,
            miniters: 0,
            ncols: Some(0),
            ..MeterOptions::default()
        }
    }

    #[test]
    fn displays_initial_state_on_creation() {
        let clock = ManualClock::new();
        let m = meter(every_iteration(), &clock);
        assert_eq!(m.hook().displays, vec![(0, "0it [00:00, ?it/s]".to_string())]);
    }

    #[test]
    fn mininterval_throttles() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            mininterval: Duration::from_secs(1),
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        assert!(!m.update(1));
        clock.advance(Duration::from_millis(999));
        assert!(!m.update(1));
        clock.advance(Duration::from_millis(1));
        assert!(m.update(1));
        assert_eq!(m.hook().displays.last().map(|d| d.0), Some(3));
    }

    #[test]
    fn miniters_throttles() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            miniters: 3,
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        assert!(!m.update(1));
        assert!(!m.update(1));
        assert!(m.update(1));
    }

    #[test]
    fn delay_postpones_first_display() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            delay: Duration::from_secs(2),
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        assert!(m.hook().displays.is_empty());
        clock.advance(Duration::from_secs(1));
        assert!(!m.update(1));
        clock.advance(Duration::from_secs(1));
        assert!(m.update(1));
        assert_eq!(m.hook().displays.len(), 1);
    }

    #[test]
    fn never_displayed_meter_skips_final_display() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            delay: Duration::from_secs(10),
            leave: Some(true),
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        m.update(1);
        m.close();
        assert!(m.hook().displays.is_empty());
        assert_eq!(m.hook().closes, vec![true]);
    }

    #[test]
    fn close_is_idempotent() {
        let clock = ManualClock::new();
        let mut m = meter(every_iteration(), &clock);
        m.close();
        m.close();
        assert_eq!(m.hook().closes.len(), 1);
    }

    #[test]
    fn disabled_meter_never_displays() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            disable: true,
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        assert!(!m.update(5));
        m.close();
        assert_eq!(m.state().n(), 5);
        assert!(m.hook().displays.is_empty());
        assert!(m.hook().closes.is_empty());
    }

    #[test]
    fn leave_defaults_to_outermost() {
        let clock = ManualClock::new();
        let registry = Arc::new(PositionRegistry::new());
        let outer = Meter::with_clock(every_iteration(), Recorder::default(), Arc::new(clock.clone()), registry.clone());
        let mut inner = Meter::with_clock(every_iteration(), Recorder::default(), Arc::new(clock.clone()), registry.clone());
        assert_eq!(outer.state().pos(), 0);
        assert_eq!(inner.state().pos(), 1);
        inner.close();
        assert_eq!(inner.hook().closes, vec![false]);
        drop(outer);
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn final_display_when_leaving() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            total: Some(2),
            leave: Some(true),
            ..every_iteration()
        };
        let mut m = meter(options, &clock);
        m.update(2);
        m.close();
        let last = m.hook().displays.last().map(|d| d.0);
        assert_eq!(last, Some(2));
        assert_eq!(m.hook().displays.len(), 3);
    }

    #[test]
    fn smoothed_rate() {
        let clock = ManualClock::new();
        let mut m = meter(every_iteration(), &clock);
        clock.advance(Duration::from_secs(2));
        m.update(1);
        let rate = m.state().format_dict().rate.unwrap();
        assert!((rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn huge_updates_saturate() {
        let clock = ManualClock::new();
        let mut m = meter(every_iteration(), &clock);
        m.update(u64::MAX);
        m.update(1);
        assert_eq!(m.state().n(), u64::MAX);
    }

    #[test]
    fn reset_restarts_count() {
        let clock = ManualClock::new();
        let mut m = meter(every_iteration(), &clock);
        m.update(3);
        m.reset(Some(10));
        assert_eq!(m.state().n(), 0);
        assert_eq!(m.state().total(), Some(10));
    }
}
