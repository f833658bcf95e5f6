//! Console display of a meter.
//!
//! The console line is an [`indicatif`] progress bar whose only content is
//! the meter text, so the console shows exactly what the UI shows.

use super::{DisplayHook, MeterState};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Template of the console line: the meter text alone.
const CONSOLE_TEMPLATE: &str = "{msg}";

/// Where the console line is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// Standard error, like most progress meters.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// Nowhere. The line still tracks its state.
    Hidden,
}

impl ConsoleTarget {
    fn draw_target(self) -> ProgressDrawTarget {
        match self {
            ConsoleTarget::Stderr => ProgressDrawTarget::stderr(),
            ConsoleTarget::Stdout => ProgressDrawTarget::stdout(),
            ConsoleTarget::Hidden => ProgressDrawTarget::hidden(),
        }
    }
}

/// Draws the meter text on a console line.
#[derive(Clone)]
pub struct ConsoleHook {
    bar: ProgressBar,
}

impl std::fmt::Debug for ConsoleHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleHook")
            .field("hidden", &self.bar.is_hidden())
            .field("position", &self.bar.position())
            .finish()
    }
}

impl ConsoleHook {
    /// Creates a console line on `target`.
    pub fn new(target: ConsoleTarget) -> Self {
        let style = ProgressStyle::with_template(CONSOLE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::with_draw_target(None, target.draw_target()).with_style(style);
        Self { bar }
    }

    /// The underlying progress bar.
    pub fn progress_bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl DisplayHook for ConsoleHook {
    fn display(&mut self, state: &MeterState) {
        if let Some(total) = state.total() {
            self.bar.set_length(total);
        }
        self.bar.set_position(state.n());
        self.bar.set_message(state.format_meter());
    }

    fn close(&mut self, _state: &MeterState, leave: bool) {
        if leave {
            self.bar.finish();
        } else {
            self.bar.finish_and_clear();
        }
    }
}
