//! Content stream builder for the overlay drawn on a template page.
//!
//! Coordinates are PDF points, origin bottom-left.

use lopdf::Object;
use lopdf::content::{Content, Operation};

use super::font::text_operand;
use crate::error::Result;
use crate::geometry::PdfRect;
use crate::template::Rgb;

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rgb_operands(color: Rgb) -> Vec<Object> {
    color.to_unit().iter().map(|c| Object::Real(*c)).collect()
}

/// Accumulates drawing operations for one page.
#[derive(Debug, Default)]
pub struct PageCanvas {
    ops: Vec<Operation>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Push the graphics state (`q`).
    pub fn save(&mut self) {
        self.ops.push(Operation::new("q", vec![]));
    }

    /// Pop the graphics state (`Q`).
    pub fn restore(&mut self) {
        self.ops.push(Operation::new("Q", vec![]));
    }

    /// Solid rectangle, used for field backgrounds.
    pub fn fill_rect(&mut self, rect: &PdfRect, color: Rgb) {
        self.save();
        self.ops.push(Operation::new("rg", rgb_operands(color)));
        self.ops.push(Operation::new(
            "re",
            vec![
                real(rect.x),
                real(rect.y),
                real(rect.width),
                real(rect.height),
            ],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.restore();
    }

    /// One run of text with its baseline starting at `(x, y)`.
    ///
    /// `encoded` is the font-specific byte string from
    /// [`super::PdfFont::encode`].
    pub fn text(&mut self, font: &str, size: f64, color: Rgb, x: f64, y: f64, encoded: Vec<u8>) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), real(size)],
        ));
        self.ops.push(Operation::new("rg", rgb_operands(color)));
        self.ops.push(Operation::new("Td", vec![real(x), real(y)]));
        self.ops.push(Operation::new("Tj", vec![text_operand(encoded)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Paint an image XObject stretched over `rect`.
    pub fn image(&mut self, name: &str, rect: &PdfRect) {
        self.save();
        self.ops.push(Operation::new(
            "cm",
            vec![
                real(rect.width),
                real(0.0),
                real(0.0),
                real(rect.height),
                real(rect.x),
                real(rect.y),
            ],
        ));
        self.ops.push(Operation::new(
            "Do",
            vec![Object::Name(name.as_bytes().to_vec())],
        ));
        self.restore();
    }

    pub fn into_content(self) -> Content {
        Content { operations: self.ops }
    }

    /// Serialize to content stream bytes.
    pub fn encode(self) -> Result<Vec<u8>> {
        Ok(self.into_content().encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(canvas: PageCanvas) -> Vec<String> {
        canvas
            .into_content()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn test_text_block() {
        let mut c = PageCanvas::new();
        c.text("VdF1", 12.0, Rgb::BLACK, 10.0, 20.0, b"Hi".to_vec());
        assert_eq!(operators(c), vec!["BT", "Tf", "rg", "Td", "Tj", "ET"]);
    }

    #[test]
    fn test_rect_is_isolated() {
        let mut c = PageCanvas::new();
        c.fill_rect(
            &PdfRect {
                x: 0.0,
                y: 0.0,
                width: 5.0,
                height: 5.0,
            },
            Rgb::WHITE,
        );
        assert_eq!(operators(c), vec!["q", "rg", "re", "f", "Q"]);
    }

    #[test]
    fn test_encode_round_trips_through_decoder() {
        let mut c = PageCanvas::new();
        c.image(
            "VdQ1",
            &PdfRect {
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 3.0,
            },
        );
        let bytes = c.encode().unwrap();
        let decoded = Content::decode(&bytes).unwrap();
        let ops: Vec<&str> = decoded.operations.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(ops, vec!["q", "cm", "Do", "Q"]);
    }
}
