//! Which widgets a bar format asks for.
//!
//! In a template, `{bar}` marks where a console meter draws its literal bar.
//! UI hosts draw the bar with a dedicated widget instead, so the placeholder
//! is removed from the template and its presence is remembered: a template
//! with a placeholder asks for a progress bar, and a template with anything
//! left once the placeholder is gone asks for a text line.

use regex::Regex;
use std::sync::LazyLock;

/// Bar placeholder, with up to two `:` or `!` modifiers such as `{bar:10u}`.
static BAR_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{bar(?:[:!][a-zA-Z0-9]+){0,2}\}").expect("invalid regex"));

/// Outcome of analysing a bar format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDecision {
    /// Render the progress widget.
    pub show_bar: bool,
    /// Render the meter text.
    pub show_text: bool,
    /// The template without its bar placeholders.
    pub bar_format: Option<String>,
}

impl RenderDecision {
    /// Analyses `bar_format`.
    ///
    /// ```rust
    /// use stprogress::RenderDecision;
    ///
    /// let decision = RenderDecision::decide(Some("{bar}{desc}"));
    /// assert!(decision.show_bar && decision.show_text);
    /// assert_eq!(decision.bar_format.as_deref(), Some("{desc}"));
    ///
    /// let decision = RenderDecision::decide(Some("{bar:10}"));
    /// assert!(decision.show_bar && !decision.show_text);
    /// ```
    pub fn decide(bar_format: Option<&str>) -> Self {
        let Some(original) = bar_format.filter(|f| !f.is_empty()) else {
            return Self {
                show_bar: true,
                show_text: true,
                bar_format: bar_format.map(str::to_owned),
            };
        };

        let stripped = BAR_PLACEHOLDER.replace_all(original, "");
        Self {
            show_bar: stripped != original,
            show_text: !stripped.trim().is_empty(),
            bar_format: Some(stripped.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(bar_format: Option<&str>) -> (bool, bool) {
        let d = RenderDecision::decide(bar_format);
        (d.show_bar, d.show_text)
    }

    #[test]
    fn absent_format_shows_everything() {
        assert_eq!(flags(None), (true, true));
        assert_eq!(flags(Some("")), (true, true));
        assert_eq!(RenderDecision::decide(Some("")).bar_format.as_deref(), Some(""));
    }

    #[test]
    fn bar_only() {
        assert_eq!(flags(Some("{bar}")), (true, false));
        assert_eq!(flags(Some("  {bar}  ")), (true, false));
    }

    #[test]
    fn bar_and_text() {
        assert_eq!(flags(Some("{bar}{desc}")), (true, true));
        assert_eq!(flags(Some("{l_bar}{bar}{r_bar}")), (true, true));
    }

    #[test]
    fn text_only() {
        assert_eq!(flags(Some("{desc}")), (false, true));
        assert_eq!(flags(Some("blabla")), (false, true));
    }

    #[test]
    fn modifiers_are_stripped() {
        let d = RenderDecision::decide(Some("{bar:10}|{bar!r:u}|{bar:-5}"));
        assert_eq!(d.bar_format.as_deref(), Some("||{bar:-5}"));
        assert!(d.show_bar);
    }

    #[test]
    fn three_modifiers_are_not_a_placeholder() {
        let d = RenderDecision::decide(Some("{bar:a:b:c}"));
        assert!(!d.show_bar);
        assert!(d.show_text);
    }
}
