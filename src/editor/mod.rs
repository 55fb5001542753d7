//! # Template Field Editor
//!
//! Headless interaction model of the overlay editor shown over a PDF
//! preview. A UI layer forwards pointer events in container pixels and
//! renders whatever state the editor exposes; all rules about selection,
//! dragging, resizing and deletion live here.
//!
//! ## Pointer model
//!
//! | Pointer down on | Starts |
//! |-----------------|--------|
//! | a resize handle of the selected field | resizing |
//! | a field (topmost wins) | selecting + moving |
//! | empty space | drawing a new field, selection cleared |
//!
//! Moves and resizes stay inside the container; no field gets smaller than
//! [`MIN_FIELD_SIZE`]. A drawn rectangle becomes a `data` field on pointer
//! up when it is at least that big.
//!
//! ## Example
//!
//! ```
//! use validoc::editor::FieldEditor;
//!
//! let mut editor = FieldEditor::new(800.0, 1035.0).unwrap();
//! editor.pointer_down(10.0, 10.0);
//! editor.pointer_move(110.0, 40.0);
//! let id = editor.pointer_up(110.0, 40.0).unwrap();
//!
//! assert_eq!(editor.selected_id(), Some(id.as_str()));
//! assert!(editor.request_delete(&id));
//! assert!(editor.confirm_delete().is_some());
//! assert!(editor.fields().is_empty());
//! ```

mod handles;
mod menu;

pub use handles::ResizeHandle;
pub use menu::{ContextMenu, FieldEdit, MenuItem, clamp_font_size};

use log::debug;

use crate::error::{Result, ValidocError};
use crate::geometry::PixelRect;
use crate::template::{Field, FieldCollection, FieldSnapshot, Template};

/// Smallest field side, in container pixels.
pub const MIN_FIELD_SIZE: f64 = 10.0;

/// Distance from a handle center that still grabs it.
pub const HANDLE_RADIUS: f64 = 6.0;

/// What the pointer is currently doing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Drawing {
        start: (f64, f64),
        current: (f64, f64),
    },
    Moving {
        id: String,
        /// Pointer offset from the field's top-left corner
        grab: (f64, f64),
    },
    Resizing {
        id: String,
        handle: ResizeHandle,
        original: PixelRect,
    },
}

/// Editing state for one template page.
#[derive(Debug, Clone)]
pub struct FieldEditor {
    fields: FieldCollection,
    container_width: f64,
    container_height: f64,
    page: u32,
    selected: Option<String>,
    interaction: Interaction,
    menu: Option<ContextMenu>,
    pending_delete: Option<String>,
}

impl FieldEditor {
    /// Empty editor over a preview of `container_width` × `container_height`.
    pub fn new(container_width: f64, container_height: f64) -> Result<Self> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return Err(ValidocError::InvalidContainerWidth(container_width));
        }
        if !container_height.is_finite() || container_height <= 0.0 {
            return Err(ValidocError::InvalidPageSize(container_width, container_height));
        }
        Ok(Self {
            fields: FieldCollection::new(),
            container_width,
            container_height,
            page: 1,
            selected: None,
            interaction: Interaction::Idle,
            menu: None,
            pending_delete: None,
        })
    }

    /// Resume editing a persisted template.
    pub fn from_template(template: &Template, container_height: f64) -> Result<Self> {
        let width = template.container_width.ok_or_else(|| {
            ValidocError::Template("containerWidth is required to edit a template".to_string())
        })?;
        let mut editor = Self::new(width, container_height)?;
        editor.fields = FieldCollection::from_fields(template.fields.clone());
        editor.page = template.page;
        Ok(editor)
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn container_size(&self) -> (f64, f64) {
        (self.container_width, self.container_height)
    }

    pub fn fields(&self) -> &[Field] {
        self.fields.fields()
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn version(&self) -> u64 {
        self.fields.version()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        self.fields.snapshot()
    }

    /// Template for rendering, built from the current snapshot.
    pub fn template_snapshot(&self) -> Template {
        Template::from_snapshot(self.container_width, self.page, &self.fields.snapshot())
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Field> {
        self.selected.as_deref().and_then(|id| self.fields.get(id))
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id.filter(|id| self.fields.get(id).is_some()).map(str::to_string);
    }

    /// Topmost field under the point (later fields are drawn on top).
    pub fn field_at(&self, x: f64, y: f64) -> Option<&Field> {
        self.fields.fields().iter().rev().find(|f| f.rect().contains(x, y))
    }

    /// Rectangle being drawn, for the UI to preview.
    pub fn drawing_preview(&self) -> Option<PixelRect> {
        match self.interaction {
            Interaction::Drawing { start, current } => {
                Some(PixelRect::from_corners(start.0, start.1, current.0, current.1))
            }
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.menu = None;

        let grabbed = self.selected().and_then(|field| {
            ResizeHandle::hit(&field.rect(), x, y, HANDLE_RADIUS)
                .map(|handle| (field.id.clone(), handle, field.rect()))
        });
        if let Some((id, handle, original)) = grabbed {
            self.interaction = Interaction::Resizing {
                id,
                handle,
                original,
            };
            return;
        }

        if let Some(field) = self.field_at(x, y) {
            let id = field.id.clone();
            let grab = (x - field.x, y - field.y);
            self.selected = Some(id.clone());
            self.interaction = Interaction::Moving { id, grab };
            return;
        }

        self.selected = None;
        let start = self.clamp_point(x, y);
        self.interaction = Interaction::Drawing {
            start,
            current: start,
        };
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        match self.interaction.clone() {
            Interaction::Idle => {}
            Interaction::Drawing { start, .. } => {
                self.interaction = Interaction::Drawing {
                    start,
                    current: self.clamp_point(x, y),
                };
            }
            Interaction::Moving { id, grab } => {
                let (cw, ch) = self.container_size();
                self.fields.update(&id, |f| {
                    f.x = (x - grab.0).clamp(0.0, (cw - f.width).max(0.0));
                    f.y = (y - grab.1).clamp(0.0, (ch - f.height).max(0.0));
                });
            }
            Interaction::Resizing {
                id,
                handle,
                original,
            } => {
                let rect = handle.resize(&original, x, y, MIN_FIELD_SIZE, self.container_size());
                self.fields.update(&id, |f| f.set_rect(rect));
            }
        }
    }

    /// Finish the current interaction. Returns the id of a newly drawn field.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Option<String> {
        self.pointer_move(x, y);
        let finished = std::mem::take(&mut self.interaction);
        let Interaction::Drawing { start, current } = finished else {
            return None;
        };
        let rect = PixelRect::from_corners(start.0, start.1, current.0, current.1);
        if rect.width < MIN_FIELD_SIZE || rect.height < MIN_FIELD_SIZE {
            debug!("Discarding {}x{} rectangle, below minimum size", rect.width, rect.height);
            return None;
        }
        let field = Field::new(rect);
        let id = field.id.clone();
        self.fields.insert(field);
        self.selected = Some(id.clone());
        Some(id)
    }

    /// Turn a text selection on the preview into a field with that literal
    /// text. Returns the new field id.
    pub fn convert_selection(&mut self, text: &str, rect: PixelRect) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let (x, y) = self.clamp_point(rect.x, rect.y);
        let width = rect.width.max(MIN_FIELD_SIZE).min((self.container_width - x).max(MIN_FIELD_SIZE));
        let height = rect.height.max(MIN_FIELD_SIZE).min((self.container_height - y).max(MIN_FIELD_SIZE));
        let field = Field::new(PixelRect::new(x, y, width, height)).with_text(text);
        let id = field.id.clone();
        self.fields.insert(field);
        self.selected = Some(id.clone());
        Some(id)
    }

    /// Open the context menu on the field under the point, selecting it.
    pub fn open_context_menu(&mut self, x: f64, y: f64) -> Option<&ContextMenu> {
        self.interaction = Interaction::Idle;
        let menu = self.field_at(x, y).map(|f| ContextMenu::new(f, x, y));
        self.selected = menu.as_ref().map(|m| m.field_id.clone());
        self.menu = menu;
        self.menu.as_ref()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn close_context_menu(&mut self) {
        self.menu = None;
    }

    /// Apply an edit to the field the menu was opened on, or else the
    /// selected field. `Delete` only requests confirmation.
    pub fn apply(&mut self, edit: FieldEdit) -> bool {
        let target = self
            .menu
            .as_ref()
            .map(|m| m.field_id.clone())
            .or_else(|| self.selected.clone());
        let Some(id) = target else {
            return false;
        };
        if edit == FieldEdit::Delete {
            self.menu = None;
            return self.request_delete(&id);
        }
        let Some(mut field) = self.fields.get(&id).cloned() else {
            return false;
        };
        // Rejected edits leave the snapshot and version untouched.
        edit.apply(&mut field) && self.fields.replace(field)
    }

    /// Ask to delete a field. Nothing is removed until confirmed.
    pub fn request_delete(&mut self, id: &str) -> bool {
        if self.fields.get(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id.to_string());
        true
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn confirm_delete(&mut self) -> Option<Field> {
        let id = self.pending_delete.take()?;
        let removed = self.fields.remove(&id)?;
        if self.selected.as_deref() == Some(id.as_str()) {
            self.selected = None;
        }
        if self.menu.as_ref().is_some_and(|m| m.field_id == id) {
            self.menu = None;
        }
        Some(removed)
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(0.0, self.container_width),
            y.clamp(0.0, self.container_height),
        )
    }
}
