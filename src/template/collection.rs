//! Versioned, copy-on-write field collection.
//!
//! The editor is the only writer. Each edit builds a new immutable snapshot
//! and swaps it in, so a renderer holding an older [`FieldSnapshot`] keeps
//! reading a consistent set of fields while editing continues.

use std::sync::Arc;

use super::types::Field;

/// Immutable view of the fields at one version.
#[derive(Debug, Clone, Default)]
pub struct FieldSnapshot {
    version: u64,
    fields: Arc<[Field]>,
}

impl FieldSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Owned collection of a template's fields.
#[derive(Debug, Clone, Default)]
pub struct FieldCollection {
    current: FieldSnapshot,
}

impl FieldCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from persisted fields. Later duplicates of an id are dropped.
    pub fn from_fields(fields: Vec<Field>) -> Self {
        let mut unique: Vec<Field> = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.iter().any(|f| f.id == field.id) {
                unique.push(field);
            }
        }
        Self {
            current: FieldSnapshot {
                version: 0,
                fields: Arc::from(unique),
            },
        }
    }

    /// Cheap handle on the current state.
    pub fn snapshot(&self) -> FieldSnapshot {
        self.current.clone()
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    pub fn fields(&self) -> &[Field] {
        self.current.fields()
    }

    pub fn get(&self, id: &str) -> Option<&Field> {
        self.current.get(id)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Append a field. Returns false (and changes nothing) if the id exists.
    pub fn insert(&mut self, field: Field) -> bool {
        if self.get(&field.id).is_some() {
            return false;
        }
        let mut next = self.current.fields.to_vec();
        next.push(field);
        self.commit(next);
        true
    }

    /// Apply `edit` to a copy of the field and swap it in.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Field)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let mut next = self.current.fields.to_vec();
        edit(&mut next[index]);
        // The id is the collection key.
        next[index].id = id.to_string();
        self.commit(next);
        true
    }

    /// Replace the field with the same id.
    pub fn replace(&mut self, field: Field) -> bool {
        let id = field.id.clone();
        self.update(&id, move |f| *f = field)
    }

    pub fn remove(&mut self, id: &str) -> Option<Field> {
        let index = self.position(id)?;
        let mut next = self.current.fields.to_vec();
        let removed = next.remove(index);
        self.commit(next);
        Some(removed)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.current.fields.iter().position(|f| f.id == id)
    }

    fn commit(&mut self, fields: Vec<Field>) {
        self.current = FieldSnapshot {
            version: self.current.version + 1,
            fields: Arc::from(fields),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;

    fn field(id: &str) -> Field {
        Field::data("name", PixelRect::new(0.0, 0.0, 10.0, 10.0)).with_id(id)
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut c = FieldCollection::from_fields(vec![field("a")]);
        let before = c.snapshot();

        c.update("a", |f| f.x = 99.0);
        c.insert(field("b"));

        assert_eq!(before.len(), 1);
        assert_eq!(before.get("a").unwrap().x, 0.0);
        assert_eq!(c.get("a").unwrap().x, 99.0);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_every_edit_bumps_version() {
        let mut c = FieldCollection::new();
        assert_eq!(c.version(), 0);
        c.insert(field("a"));
        c.update("a", |f| f.name = "cliente".into());
        c.remove("a");
        assert_eq!(c.version(), 3);
    }

    #[test]
    fn test_failed_edits_do_not_bump_version() {
        let mut c = FieldCollection::from_fields(vec![field("a")]);
        assert!(!c.insert(field("a")));
        assert!(!c.update("missing", |f| f.x = 1.0));
        assert!(c.remove("missing").is_none());
        assert_eq!(c.version(), 0);
    }

    #[test]
    fn test_update_cannot_change_id() {
        let mut c = FieldCollection::from_fields(vec![field("a")]);
        c.update("a", |f| f.id = "b".into());
        assert!(c.get("a").is_some());
        assert!(c.get("b").is_none());
    }

    #[test]
    fn test_from_fields_drops_duplicate_ids() {
        let c = FieldCollection::from_fields(vec![field("a"), field("a"), field("b")]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_order_preserved() {
        let mut c = FieldCollection::new();
        for id in ["1", "2", "3"] {
            c.insert(field(id));
        }
        c.remove("2");
        let ids: Vec<&str> = c.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
