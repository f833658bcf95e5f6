//! Rendering of meter refreshes into UI widgets.
//!
//! [`WidgetHook`] is the [`DisplayHook`] driving a progress indicator's
//! widgets. It owns two placeholders, created lazily in the host container
//! the first time they are needed:
//!
//! - the progress widget, showing the completed fraction and, on hosts that
//!   support it, the meter text inside the bar;
//! - the text widget, showing the meter text on its own line when it cannot
//!   be shown inside the bar.
//!
//! When the console mirror is enabled, every refresh is also forwarded to a
//! [`ConsoleHook`].

use super::decision::RenderDecision;
use crate::meter::{ConsoleHook, DisplayHook, MeterState};
use crate::ui::{Container, Widget};

use indicatif::ProgressBar;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Display hook rendering into the host UI, and optionally the console.
pub struct WidgetHook {
    container: Arc<dyn Container>,
    frontend: bool,
    console: Option<ConsoleHook>,
    inline_text: bool,
    should_display_progress_bar: bool,
    should_display_text: bool,
    progress_widget: Option<Box<dyn Widget>>,
    text_widget: Option<Box<dyn Widget>>,
}

impl fmt::Debug for WidgetHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetHook")
            .field("container", &self.container)
            .field("frontend", &self.frontend)
            .field("console", &self.console)
            .field("inline_text", &self.inline_text)
            .field("should_display_progress_bar", &self.should_display_progress_bar)
            .field("should_display_text", &self.should_display_text)
            .field("progress_widget", &self.progress_widget.is_some())
            .field("text_widget", &self.text_widget.is_some())
            .finish()
    }
}

impl WidgetHook {
    /// Creates a hook rendering into `container`.
    ///
    /// Nothing is created in the container until the first refresh.
    pub fn new(
        container: Arc<dyn Container>,
        frontend: bool,
        console: Option<ConsoleHook>,
        decision: &RenderDecision,
    ) -> Self {
        let inline_text = container.capabilities().inline_progress_text;
        Self {
            container,
            frontend,
            console,
            inline_text,
            should_display_progress_bar: decision.show_bar,
            should_display_text: decision.show_text,
            progress_widget: None,
            text_widget: None,
        }
    }

    /// Whether the bar format asked for a progress bar.
    pub fn should_display_progress_bar(&self) -> bool {
        self.should_display_progress_bar
    }

    /// Whether the bar format left any text to display.
    pub fn should_display_text(&self) -> bool {
        self.should_display_text
    }

    /// Whether the progress widget currently exists.
    pub fn has_progress_widget(&self) -> bool {
        self.progress_widget.is_some()
    }

    /// Whether the text widget currently exists.
    pub fn has_text_widget(&self) -> bool {
        self.text_widget.is_some()
    }

    /// The console line, if the console mirror is enabled.
    pub fn console_bar(&self) -> Option<&ProgressBar> {
        self.console.as_ref().map(ConsoleHook::progress_bar)
    }

    fn progress_widget(&mut self) -> &mut Box<dyn Widget> {
        let container = &self.container;
        self.progress_widget.get_or_insert_with(|| container.empty())
    }

    fn text_widget(&mut self) -> &mut Box<dyn Widget> {
        let container = &self.container;
        self.text_widget.get_or_insert_with(|| container.empty())
    }

    /// Renders the state of the meter into the widgets.
    ///
    /// A bar is shown when the total is known and positive and the bar
    /// format asked for one. The meter text goes inside the bar when the host
    /// supports it, in the text widget otherwise.
    pub fn st_display(&mut self, state: &MeterState) {
        let meter_text = self
            .should_display_text
            .then(|| state.format_meter())
            .filter(|text| !text.is_empty());
        let fraction = state
            .total()
            .filter(|&total| total > 0)
            .map(|total| (state.n() as f64 / total as f64).min(1.0));

        match (fraction, meter_text) {
            (Some(fraction), None) if self.should_display_progress_bar => {
                self.progress_widget().progress(fraction, None);
            }
            (Some(fraction), Some(text)) if self.should_display_progress_bar => {
                if self.inline_text {
                    self.progress_widget().progress(fraction, Some(&text));
                } else {
                    self.text_widget().write(&text);
                    self.progress_widget().progress(fraction, None);
                }
            }
            (_, Some(text)) => self.text_widget().write(&text),
            (_, None) => {}
        }
    }

    /// Clears the widgets unless the indicator should stay visible.
    ///
    /// Cleared widgets are dropped, so a later refresh creates fresh ones.
    pub fn clear_ui(&mut self, leave: bool) {
        if leave {
            return;
        }
        if let Some(mut text) = self.text_widget.take() {
            text.empty();
        }
        if let Some(mut progress) = self.progress_widget.take() {
            progress.empty();
        }
    }
}

impl DisplayHook for WidgetHook {
    fn display(&mut self, state: &MeterState) {
        if let Some(console) = self.console.as_mut() {
            console.display(state);
        }
        if self.frontend {
            self.st_display(state);
        }
    }

    fn close(&mut self, state: &MeterState, leave: bool) {
        if let Some(console) = self.console.as_mut() {
            console.close(state, leave);
        }
        trace!(
            leave,
            progress_widget = self.progress_widget.is_some(),
            text_widget = self.text_widget.is_some(),
            "Clearing progress widgets"
        );
        self.clear_ui(leave);
    }
}
