//! Text field rendering: value resolution, line layout and drawing.
//!
//! Lines are top-aligned in the field box. The first baseline sits one
//! font size below the box top and each following line is
//! `font_size + line_gap` points lower:
//!
//! ```text
//!   top ─────────────────────────────
//!         Línea 1            ← top - size
//!         Línea 2            ← top - size - (size + gap)
//!   ...
//! ```
//!
//! Every line is measured with the same font and size it is drawn with, so
//! the alignment offset matches the drawn glyphs.

use log::debug;

use crate::geometry::PdfRect;
use crate::pdf::{FontId, FontRegistry, PageCanvas, PdfFont, TextMeasure};
use crate::record::DataRecord;
use crate::template::TextSpec;

/// Where a field's text came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextValue {
    /// The field's literal `text`
    Literal(String),
    /// The bound record attribute
    Bound(String),
    /// Nothing resolved: the field's own name is shown
    Placeholder(String),
}

impl TextValue {
    pub fn as_str(&self) -> &str {
        match self {
            TextValue::Literal(s) | TextValue::Bound(s) | TextValue::Placeholder(s) => s,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TextValue::Placeholder(_))
    }
}

/// Literal text, else the bound attribute, else the field name.
pub fn resolve_text(spec: &TextSpec, name: &str, record: &DataRecord) -> TextValue {
    if let Some(text) = &spec.literal {
        return TextValue::Literal(text.clone());
    }
    match record.resolve(name) {
        Some(v) => TextValue::Bound(v),
        None => {
            debug!("Binding '{}' unresolved, drawing field name", name);
            TextValue::Placeholder(name.to_string())
        }
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Left edge of the line after alignment
    pub x: f64,
    pub baseline: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub lines: Vec<PlacedLine>,
}

/// Split a value into the lines to draw.
///
/// Explicit `textLines` win for multi-line fields; otherwise the value is
/// split on newlines. Multi-line fields are also wrapped to `max_width`.
pub fn split_lines(
    spec: &TextSpec,
    value: &str,
    font: &dyn TextMeasure,
    max_width: f64,
) -> Vec<String> {
    let raw: Vec<String> = match &spec.lines {
        Some(lines) => lines.iter().flat_map(|l| newline_split(l)).collect(),
        None => newline_split(value),
    };
    if !spec.multi_line {
        return raw;
    }
    raw.iter()
        .flat_map(|line| wrap_line(line, font, spec.font_size, max_width))
        .collect()
}

fn newline_split(value: &str) -> Vec<String> {
    value
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

/// Greedy word wrap. A single word wider than the box keeps its own line.
fn wrap_line(line: &str, font: &dyn TextMeasure, size: f64, max_width: f64) -> Vec<String> {
    if font.text_width(line, size) <= max_width {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if font.text_width(&candidate, size) <= max_width {
            current = candidate;
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Position `lines` inside `rect`.
pub fn layout_text(
    lines: &[String],
    rect: &PdfRect,
    spec: &TextSpec,
    font: &dyn TextMeasure,
    line_gap: f64,
) -> TextLayout {
    let size = spec.font_size;
    let pitch = size + line_gap;
    let top = rect.top();
    TextLayout {
        lines: lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let width = font.text_width(text, size);
                PlacedLine {
                    text: text.clone(),
                    x: rect.x + spec.align.offset(rect.width, width),
                    baseline: top - size - i as f64 * pitch,
                    width,
                }
            })
            .collect(),
    }
}

/// Draw a laid-out text field: background first, then each line.
pub fn draw_text(
    canvas: &mut PageCanvas,
    fonts: &mut FontRegistry,
    font_id: FontId,
    font: &PdfFont,
    rect: &PdfRect,
    spec: &TextSpec,
    layout: &TextLayout,
) {
    if let Some(bg) = spec.background {
        canvas.fill_rect(rect, bg);
    }
    for line in layout.lines.iter().filter(|l| !l.text.is_empty()) {
        let resource = fonts.record(font_id, &line.text);
        canvas.text(
            &resource,
            spec.font_size,
            spec.color,
            line.x,
            line.baseline,
            font.encode(&line.text),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Align, Rgb};

    /// Each character is half the font size wide.
    struct Fixed;

    impl TextMeasure for Fixed {
        fn text_width(&self, text: &str, size: f64) -> f64 {
            text.chars().count() as f64 * size / 2.0
        }
    }

    fn spec(align: Align) -> TextSpec {
        TextSpec {
            literal: None,
            font_family: None,
            font_size: 10.0,
            align,
            color: Rgb::BLACK,
            background: None,
            multi_line: false,
            lines: None,
        }
    }

    fn rect() -> PdfRect {
        PdfRect {
            x: 100.0,
            y: 500.0,
            width: 200.0,
            height: 40.0,
        }
    }

    #[test]
    fn test_alignment_edges() {
        let lines = vec!["abcd".to_string()]; // 20pt wide
        let left = layout_text(&lines, &rect(), &spec(Align::Left), &Fixed, 2.0);
        let center = layout_text(&lines, &rect(), &spec(Align::Center), &Fixed, 2.0);
        let right = layout_text(&lines, &rect(), &spec(Align::Right), &Fixed, 2.0);

        assert_eq!(left.lines[0].x, 100.0);
        assert_eq!(center.lines[0].x, 100.0 + (200.0 - 20.0) / 2.0);
        assert_eq!(right.lines[0].x + right.lines[0].width, 300.0);
    }

    #[test]
    fn test_baselines_step_by_size_plus_gap() {
        let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let layout = layout_text(&lines, &rect(), &spec(Align::Left), &Fixed, 2.0);
        let baselines: Vec<f64> = layout.lines.iter().map(|l| l.baseline).collect();
        assert_eq!(baselines, vec![530.0, 518.0, 506.0]);
    }

    #[test]
    fn test_value_resolution() {
        let record = DataRecord::new().with("cliente", "Gasolinera Sol");
        let s = spec(Align::Left);

        assert_eq!(
            resolve_text(&s, "cliente", &record),
            TextValue::Bound("Gasolinera Sol".to_string())
        );
        assert_eq!(
            resolve_text(&s, "placas", &record),
            TextValue::Placeholder("placas".to_string())
        );

        let mut literal = s.clone();
        literal.literal = Some("Fijo".to_string());
        assert_eq!(
            resolve_text(&literal, "cliente", &record),
            TextValue::Literal("Fijo".to_string())
        );
    }

    #[test]
    fn test_newlines_split_without_multi_line() {
        let lines = split_lines(&spec(Align::Left), "uno\r\ndos", &Fixed, 1000.0);
        assert_eq!(lines, vec!["uno", "dos"]);
    }

    #[test]
    fn test_explicit_lines_and_wrap() {
        let mut s = spec(Align::Left);
        s.multi_line = true;
        s.lines = Some(vec!["aa bb cc".to_string(), "dd".to_string()]);
        // 5pt per char: "aa bb" = 25pt fits in 30, "aa bb cc" = 40 does not
        let lines = split_lines(&s, "ignored", &Fixed, 30.0);
        assert_eq!(lines, vec!["aa bb", "cc", "dd"]);
    }

    #[test]
    fn test_long_word_keeps_own_line() {
        let lines = wrap_line("abcdefghij xy", &Fixed, 10.0, 20.0);
        assert_eq!(lines, vec!["abcdefghij", "xy"]);
    }

    #[test]
    fn test_draw_background_before_text() {
        let font = PdfFont::helvetica();
        let mut s = spec(Align::Left);
        s.background = Some(Rgb::WHITE);
        let layout = layout_text(&["Hola".to_string()], &rect(), &s, &font, 2.0);

        let mut canvas = PageCanvas::new();
        let mut fonts = FontRegistry::new();
        let id = crate::pdf::FontSet::standard().default_font();
        draw_text(&mut canvas, &mut fonts, id, &font, &rect(), &s, &layout);

        let ops: Vec<String> = canvas
            .into_content()
            .operations
            .into_iter()
            .map(|o| o.operator)
            .collect();
        assert_eq!(ops.first().map(String::as_str), Some("q"));
        assert!(ops.iter().position(|o| o == "f") < ops.iter().position(|o| o == "Tj"));
        assert!(!fonts.is_empty());
    }
}
