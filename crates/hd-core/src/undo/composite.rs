//! Grouping edits into one undo step.

use crate::drawing::Drawing;
use crate::error::EditError;
use crate::undo::edit::{EditState, UndoableEdit};
use std::borrow::Cow;

/// A sequence of edits undone and redone as one.
///
/// A composite is open while it collects edits and closed once its scope
/// ends; only a closed composite can be undone.
#[derive(Debug, Clone)]
pub struct CompositeEdit {
    label: Cow<'static, str>,
    edits: Vec<UndoableEdit>,
    open: bool,
}

impl CompositeEdit {
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            edits: Vec::new(),
            open: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
    }

    pub fn edits(&self) -> &[UndoableEdit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn is_significant(&self) -> bool {
        self.edits.iter().any(UndoableEdit::is_significant)
    }

    /// Append `edit`, first offering it to the most recent edit.
    pub fn add_edit(&mut self, mut edit: UndoableEdit) {
        if let Some(last) = self.edits.last_mut() {
            if last.add_edit(&mut edit) {
                log::trace!("composite {:?}: coalesced {:?}", self.label, edit.label());
                return;
            }
            if edit.replace_edit(last) {
                log::trace!("composite {:?}: replaced {:?}", self.label, last.label());
                self.edits.pop();
            }
        }
        debug_assert_ne!(edit.state(), EditState::Dead);
        self.edits.push(edit);
    }

    pub(crate) fn undo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        for edit in self.edits.iter_mut().rev() {
            edit.undo(drawing)?;
        }
        Ok(())
    }

    pub(crate) fn redo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        for edit in &mut self.edits {
            edit.redo(drawing)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeKey, AttributeValue};
    use crate::id::FigureId;

    #[test]
    fn same_key_attribute_edits_collapse() {
        let id = FigureId::next();
        let mut c = CompositeEdit::new("Style");
        c.add_edit(UndoableEdit::attribute(
            id,
            AttributeKey::StrokeWidth,
            None,
            Some(AttributeValue::Number(2.0)),
        ));
        c.add_edit(UndoableEdit::attribute(
            id,
            AttributeKey::StrokeWidth,
            Some(AttributeValue::Number(2.0)),
            Some(AttributeValue::Number(3.0)),
        ));
        c.add_edit(UndoableEdit::attribute(
            id,
            AttributeKey::Layer,
            None,
            Some(AttributeValue::Number(1.0)),
        ));
        assert_eq!(c.edits().len(), 2);
        assert!(c.is_significant());
    }

    #[test]
    fn open_composite_cannot_undo() {
        let mut edit = UndoableEdit::new(
            crate::undo::EditKind::Composite(CompositeEdit::new("Move")),
            "Move",
        );
        assert!(!edit.can_undo());
        edit.close();
        assert!(edit.can_undo());
    }
}
