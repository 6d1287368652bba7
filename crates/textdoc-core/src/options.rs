//! Tuning knobs for the document engine.
//!
//! All option structs implement [`Default`] and deserialize with missing fields
//! falling back to those defaults, so hosts can keep them in a config file.

use serde::Deserialize;

/// Gap sizing policy for [`GapBuffer`](crate::storage::GapBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GapBufferOptions {
    /// Every reallocation leaves at least this many free slots.
    pub min_gap: usize,
    /// A gap larger than this is shrunk back to `min_gap` on the next edit.
    pub max_gap: usize,
}

impl GapBufferOptions {
    /// Create options with explicit bounds. `max_gap` is raised to `min_gap` if smaller.
    pub fn new(min_gap: usize, max_gap: usize) -> Self {
        Self {
            min_gap,
            max_gap: max_gap.max(min_gap),
        }
    }
}

impl Default for GapBufferOptions {
    fn default() -> Self {
        Self {
            min_gap: 32,
            max_gap: 4096,
        }
    }
}

/// Controls when incremental re-highlighting gives up and re-tokenizes the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    /// Fraction of the document a single propagation may touch before switching to a full pass.
    pub full_rehighlight_ratio: f64,
    /// Propagations shorter than this never trigger the full pass.
    pub full_rehighlight_min_lines: usize,
}

impl HighlightOptions {
    /// Number of touched lines after which a propagation falls back to a full pass.
    pub fn fallback_threshold(&self, line_count: usize) -> usize {
        let by_ratio = (line_count as f64 * self.full_rehighlight_ratio.clamp(0.0, 1.0)).ceil();
        (by_ratio as usize).max(self.full_rehighlight_min_lines)
    }
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            full_rehighlight_ratio: 0.5,
            full_rehighlight_min_lines: 64,
        }
    }
}

/// Options for a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Gap buffer sizing.
    pub gap: GapBufferOptions,
    /// Re-highlight propagation policy.
    pub highlight: HighlightOptions,
    /// Label given to fold regions produced by the built-in strategies.
    pub default_fold_text: String,
}

impl DocumentOptions {
    /// Replace the gap buffer options.
    pub fn with_gap(mut self, gap: GapBufferOptions) -> Self {
        self.gap = gap;
        self
    }

    /// Replace the highlight options.
    pub fn with_highlight(mut self, highlight: HighlightOptions) -> Self {
        self.highlight = highlight;
        self
    }

    /// Replace the default fold label.
    pub fn with_default_fold_text(mut self, text: impl Into<String>) -> Self {
        self.default_fold_text = text.into();
        self
    }
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            gap: GapBufferOptions::default(),
            highlight: HighlightOptions::default(),
            default_fold_text: String::from("..."),
        }
    }
}
