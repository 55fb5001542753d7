//! Context menu actions on a field.

use crate::config::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::template::{Align, Field, FieldKind, QrErrorLevel};

/// One attribute change from the context menu or property panel.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    SetKind(FieldKind),
    /// Bound record attribute
    SetName(String),
    SetFontFamily(Option<String>),
    /// Clamped into the accepted font size range
    SetFontSize(f64),
    SetAlign(Align),
    SetColor(Option<String>),
    SetBackgroundColor(Option<String>),
    SetText(Option<String>),
    /// `Some` turns multi-line on with explicit lines, `None` turns it off
    SetLines(Option<Vec<String>>),
    SetQrData(Option<String>),
    SetQrSize(Option<u32>),
    SetQrColors {
        foreground: Option<String>,
        background: Option<String>,
    },
    SetQrErrorLevel(QrErrorLevel),
    /// Asks for confirmation; never removes directly
    Delete,
}

impl FieldEdit {
    /// Apply to `field`. Returns false for edits that change nothing here
    /// (`Delete`, or a font size that is not a number).
    pub fn apply(self, field: &mut Field) -> bool {
        match self {
            FieldEdit::SetKind(kind) => field.kind = kind,
            FieldEdit::SetName(name) => field.name = name,
            FieldEdit::SetFontFamily(family) => field.font_family = family,
            FieldEdit::SetFontSize(size) => {
                if size.is_nan() {
                    return false;
                }
                field.font_size = Some(clamp_font_size(size));
            }
            FieldEdit::SetAlign(align) => field.align = Some(align.as_str().to_string()),
            FieldEdit::SetColor(color) => field.color = color,
            FieldEdit::SetBackgroundColor(color) => field.background_color = color,
            FieldEdit::SetText(text) => field.text = text,
            FieldEdit::SetLines(lines) => {
                field.is_multi_line = lines.is_some();
                field.text_lines = lines;
            }
            FieldEdit::SetQrData(data) => field.qr_data = data,
            FieldEdit::SetQrSize(size) => field.qr_size = size,
            FieldEdit::SetQrColors {
                foreground,
                background,
            } => {
                field.qr_color = foreground;
                field.qr_background_color = background;
            }
            FieldEdit::SetQrErrorLevel(level) => {
                field.qr_error_correction_level = Some(level.as_str().to_string())
            }
            FieldEdit::Delete => return false,
        }
        true
    }
}

pub fn clamp_font_size(size: f64) -> f64 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Entries shown in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Kind,
    Binding,
    Font,
    Alignment,
    Colors,
    Text,
    Lines,
    QrOptions,
    Delete,
}

const DATA_ITEMS: &[MenuItem] = &[
    MenuItem::Kind,
    MenuItem::Binding,
    MenuItem::Font,
    MenuItem::Alignment,
    MenuItem::Colors,
    MenuItem::Text,
    MenuItem::Lines,
    MenuItem::Delete,
];

const QR_ITEMS: &[MenuItem] = &[
    MenuItem::Kind,
    MenuItem::Binding,
    MenuItem::QrOptions,
    MenuItem::Delete,
];

/// An open context menu, anchored where the user clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub field_id: String,
    pub x: f64,
    pub y: f64,
    kind: FieldKind,
}

impl ContextMenu {
    pub fn new(field: &Field, x: f64, y: f64) -> Self {
        Self {
            field_id: field.id.clone(),
            x,
            y,
            kind: field.kind,
        }
    }

    pub fn items(&self) -> &'static [MenuItem] {
        match self.kind {
            FieldKind::Data => DATA_ITEMS,
            FieldKind::Qr => QR_ITEMS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;

    fn field() -> Field {
        Field::data("cliente", PixelRect::new(0.0, 0.0, 50.0, 20.0))
    }

    #[test]
    fn test_font_size_clamped() {
        let mut f = field();
        assert!(FieldEdit::SetFontSize(200.0).apply(&mut f));
        assert_eq!(f.font_size, Some(72.0));
        assert!(FieldEdit::SetFontSize(1.0).apply(&mut f));
        assert_eq!(f.font_size, Some(6.0));
        assert!(!FieldEdit::SetFontSize(f64::NAN).apply(&mut f));
        assert_eq!(f.font_size, Some(6.0));
    }

    #[test]
    fn test_lines_toggle_multi_line() {
        let mut f = field();
        FieldEdit::SetLines(Some(vec!["a".into(), "b".into()])).apply(&mut f);
        assert!(f.is_multi_line);
        FieldEdit::SetLines(None).apply(&mut f);
        assert!(!f.is_multi_line);
        assert_eq!(f.text_lines, None);
    }

    #[test]
    fn test_align_and_level_written_as_strings() {
        let mut f = field();
        FieldEdit::SetAlign(Align::Center).apply(&mut f);
        FieldEdit::SetQrErrorLevel(QrErrorLevel::H).apply(&mut f);
        assert_eq!(f.align.as_deref(), Some("center"));
        assert_eq!(f.qr_error_correction_level.as_deref(), Some("H"));
    }

    #[test]
    fn test_delete_does_not_touch_field() {
        let mut f = field();
        let before = f.clone();
        assert!(!FieldEdit::Delete.apply(&mut f));
        assert_eq!(f, before);
    }

    #[test]
    fn test_menu_items_follow_kind() {
        let data = ContextMenu::new(&field(), 1.0, 2.0);
        assert!(data.items().contains(&MenuItem::Alignment));
        assert!(!data.items().contains(&MenuItem::QrOptions));

        let qr = Field::qr("folio", PixelRect::new(0.0, 0.0, 50.0, 50.0));
        let menu = ContextMenu::new(&qr, 1.0, 2.0);
        assert!(menu.items().contains(&MenuItem::QrOptions));
        assert_eq!(menu.items().last(), Some(&MenuItem::Delete));
    }
}
