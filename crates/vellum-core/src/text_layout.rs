//! Greedy text wrapping with pluggable glyph measurement.
//!
//! The layout engine does no font I/O: the host supplies widths through
//! [`GlyphMeasure`], so the same code runs against a real shaper, a
//! canvas `measureText`, or a fixed-advance stub in tests.

use serde::Serialize;

// ─── Glyph Measure Trait ─────────────────────────────────────────────────

/// Measures the advance width of a run of text.
pub trait GlyphMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64;
}

/// Every character advances by `ratio × font_size`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub ratio: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { ratio: 0.6 }
    }
}

impl GlyphMeasure for FixedAdvance {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * self.ratio * font_size
    }
}

// ─── Layout ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub text: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayout {
    pub lines: Vec<TextLine>,
    pub width: f64,
    pub height: f64,
    pub line_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyleInput {
    pub font_size: f64,
    /// Absolute line height; defaults to `1.2 × font_size`.
    pub line_height: Option<f64>,
    /// Wrap width. `None` only breaks at explicit newlines.
    pub max_width: Option<f64>,
}

/// Wrap `text` into lines. Words wider than `max_width` break per character.
pub fn layout_text(text: &str, style: TextStyleInput, measure: &dyn GlyphMeasure) -> TextLayout {
    let font_size = style.font_size;
    let line_height = style.line_height.unwrap_or(font_size * 1.2);
    let width_of = |s: &str| measure.measure(s, font_size);
    let mut lines: Vec<TextLine> = Vec::new();

    for paragraph in text.split('\n') {
        let Some(max) = style.max_width else {
            lines.push(TextLine {
                text: paragraph.to_string(),
                width: width_of(paragraph),
            });
            continue;
        };

        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if width_of(&candidate) <= max {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                let done = std::mem::take(&mut current);
                lines.push(TextLine {
                    width: width_of(&done),
                    text: done,
                });
            }
            if width_of(word) <= max {
                current = word.to_string();
                continue;
            }
            // Break an overlong word per character.
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if width_of(&next) > max && !current.is_empty() {
                    let done = std::mem::replace(&mut current, ch.to_string());
                    lines.push(TextLine {
                        width: width_of(&done),
                        text: done,
                    });
                } else {
                    current = next;
                }
            }
        }
        lines.push(TextLine {
            width: width_of(&current),
            text: current,
        });
    }

    let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
    let height = lines.len() as f64 * line_height;
    TextLayout {
        lines,
        width,
        height,
        line_height,
    }
}
