//! In-memory host.
//!
//! [`MemoryContainer`] stores every widget created in it along with the calls
//! it received and the element it currently shows. Clones share the same
//! storage, so one clone can be handed to a progress indicator while another
//! one is used to read the element tree back.
//!
//! ```rust
//! use stprogress::ui::{Container, Element, MemoryContainer};
//!
//! let container = MemoryContainer::new();
//! let mut widget = container.empty();
//! widget.progress(0.5, Some("half way"));
//!
//! assert_eq!(
//!     container.elements(),
//!     vec![Element::Progress { value: 0.5, text: Some("half way".into()) }],
//! );
//! ```

use super::{Container, HostCapabilities, Widget};

use parking_lot::Mutex;
use std::sync::Arc;

/// One call received by a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    /// [`Widget::progress`].
    Progress {
        /// Filled fraction.
        fraction: f64,
        /// Inline text, as passed by the caller.
        text: Option<String>,
    },
    /// [`Widget::write`].
    Write(String),
    /// [`Widget::empty`].
    Empty,
}

/// What a widget displays.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A progress bar.
    Progress {
        /// Filled fraction.
        value: f64,
        /// Text shown inside the bar, if the host supports it.
        text: Option<String>,
    },
    /// A text line.
    Text(String),
}

/// Everything known about one widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetRecord {
    /// Calls in the order they were received.
    pub calls: Vec<WidgetCall>,
    /// Element currently displayed.
    pub element: Option<Element>,
    /// Whether the handle to this widget was dropped.
    pub dropped: bool,
}

impl WidgetRecord {
    /// Progress calls received, as `(fraction, text)` pairs.
    pub fn progress_calls(&self) -> Vec<(f64, Option<String>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                WidgetCall::Progress { fraction, text } => Some((*fraction, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Texts written.
    pub fn writes(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                WidgetCall::Write(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of times the widget was emptied.
    pub fn empty_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, WidgetCall::Empty))
            .count()
    }
}

type Records = Arc<Mutex<Vec<WidgetRecord>>>;

/// A container keeping its widgets in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    records: Records,
    capabilities: HostCapabilities,
}

impl MemoryContainer {
    /// Creates an empty container with the capabilities of current hosts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container with the given capabilities.
    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            records: Records::default(),
            capabilities,
        }
    }

    /// Number of widgets created so far.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if no widget was created.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of the widget created in `index`-th position.
    pub fn widget(&self, index: usize) -> Option<WidgetRecord> {
        self.records.lock().get(index).cloned()
    }

    /// Copies of every widget, in creation order.
    pub fn widgets(&self) -> Vec<WidgetRecord> {
        self.records.lock().clone()
    }

    /// Elements currently displayed, in creation order.
    pub fn elements(&self) -> Vec<Element> {
        self.records
            .lock()
            .iter()
            .filter_map(|record| record.element.clone())
            .collect()
    }
}

impl Container for MemoryContainer {
    fn empty(&self) -> Box<dyn Widget> {
        let mut records = self.records.lock();
        records.push(WidgetRecord::default());
        Box::new(MemoryWidget {
            index: records.len() - 1,
            records: self.records.clone(),
            inline_text: self.capabilities.inline_progress_text,
        })
    }

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }
}

/// A widget of a [`MemoryContainer`].
#[derive(Debug)]
pub struct MemoryWidget {
    index: usize,
    records: Records,
    inline_text: bool,
}

impl MemoryWidget {
    fn with_record(&self, f: impl FnOnce(&mut WidgetRecord)) {
        if let Some(record) = self.records.lock().get_mut(self.index) {
            f(record);
        }
    }
}

impl Widget for MemoryWidget {
    fn progress(&mut self, fraction: f64, text: Option<&str>) {
        let inline_text = self.inline_text;
        self.with_record(|record| {
            record.calls.push(WidgetCall::Progress {
                fraction,
                text: text.map(str::to_owned),
            });
            record.element = Some(Element::Progress {
                value: fraction,
                text: text.filter(|_| inline_text).map(str::to_owned),
            });
        });
    }

    fn write(&mut self, text: &str) {
        self.with_record(|record| {
            record.calls.push(WidgetCall::Write(text.to_owned()));
            record.element = Some(Element::Text(text.to_owned()));
        });
    }

    fn empty(&mut self) {
        self.with_record(|record| {
            record.calls.push(WidgetCall::Empty);
            record.element = None;
        });
    }
}

impl Drop for MemoryWidget {
    fn drop(&mut self) {
        self.with_record(|record| record.dropped = true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_replace_their_element() {
        let container = MemoryContainer::new();
        let mut widget = container.empty();
        widget.write("first");
        widget.progress(0.25, None);
        assert_eq!(
            container.elements(),
            vec![Element::Progress { value: 0.25, text: None }]
        );
        widget.empty();
        assert!(container.elements().is_empty());
        assert_eq!(container.widget(0).unwrap().empty_count(), 1);
    }

    #[test]
    fn legacy_hosts_hide_inline_text() {
        let container = MemoryContainer::with_capabilities(HostCapabilities::legacy());
        let mut widget = container.empty();
        widget.progress(1.0, Some("done"));
        let record = container.widget(0).unwrap();
        assert_eq!(record.progress_calls(), vec![(1.0, Some("done".to_string()))]);
        assert_eq!(record.element, Some(Element::Progress { value: 1.0, text: None }));
    }

    #[test]
    fn dropping_handle_is_recorded() {
        let container = MemoryContainer::new();
        let widget = container.empty();
        assert!(!container.widget(0).unwrap().dropped);
        drop(widget);
        assert!(container.widget(0).unwrap().dropped);
    }
}
