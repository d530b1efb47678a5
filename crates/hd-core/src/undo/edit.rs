//! Reversible edits.
//!
//! Every edit stores old/new values (or the detached figure itself), never
//! an inverse operation, so undo and redo restore exact state.

use crate::attribute::{AttributeKey, AttributeValue};
use crate::drawing::Drawing;
use crate::error::EditError;
use crate::figure::{Figure, FigureGeometry};
use crate::id::FigureId;
use crate::undo::composite::CompositeEdit;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Done,
    Undone,
    /// Absorbed or replaced by another edit; never undone or redone.
    Dead,
}

#[derive(Debug, Clone)]
pub enum EditKind {
    /// A figure was inserted at `index`. Holds the figure while undone.
    AddFigure {
        id: FigureId,
        index: usize,
        figure: Option<Figure>,
    },
    /// A figure was removed from `index`. Holds the figure while done.
    RemoveFigure {
        id: FigureId,
        index: usize,
        figure: Option<Figure>,
    },
    /// Geometry snapshots around a transform, resize, rotation or reconnection.
    Geometry {
        id: FigureId,
        before: FigureGeometry,
        after: FigureGeometry,
    },
    /// Explicit attribute values; `None` means the key was unset.
    Attribute {
        id: FigureId,
        key: AttributeKey,
        before: Option<AttributeValue>,
        after: Option<AttributeValue>,
    },
    ZOrder {
        id: FigureId,
        before: usize,
        after: usize,
    },
    Composite(CompositeEdit),
}

#[derive(Debug, Clone)]
pub struct UndoableEdit {
    pub kind: EditKind,
    state: EditState,
    label: Cow<'static, str>,
    significant: bool,
}

impl UndoableEdit {
    pub fn new(kind: EditKind, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            state: EditState::Done,
            label: label.into(),
            significant: true,
        }
    }

    pub fn add_figure(id: FigureId, index: usize) -> Self {
        Self::new(
            EditKind::AddFigure {
                id,
                index,
                figure: None,
            },
            "Add Figure",
        )
    }

    pub fn remove_figure(id: FigureId, index: usize, figure: Figure) -> Self {
        Self::new(
            EditKind::RemoveFigure {
                id,
                index,
                figure: Some(figure),
            },
            "Remove Figure",
        )
    }

    pub fn geometry(
        id: FigureId,
        before: FigureGeometry,
        after: FigureGeometry,
        label: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(EditKind::Geometry { id, before, after }, label)
    }

    pub fn attribute(
        id: FigureId,
        key: AttributeKey,
        before: Option<AttributeValue>,
        after: Option<AttributeValue>,
    ) -> Self {
        Self::new(
            EditKind::Attribute {
                id,
                key,
                before,
                after,
            },
            "Change Attribute",
        )
    }

    pub fn z_order(id: FigureId, before: usize, after: usize) -> Self {
        Self::new(EditKind::ZOrder { id, before, after }, "Arrange")
    }

    /// Mark as insignificant: it is undone with its neighbours but does not
    /// by itself make the document dirty.
    pub fn insignificant(mut self) -> Self {
        self.significant = false;
        self
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_significant(&self) -> bool {
        match &self.kind {
            EditKind::Composite(c) => c.is_significant(),
            _ => self.significant,
        }
    }

    /// The figure this edit targets, if it targets exactly one.
    pub fn target(&self) -> Option<FigureId> {
        match &self.kind {
            EditKind::AddFigure { id, .. }
            | EditKind::RemoveFigure { id, .. }
            | EditKind::Geometry { id, .. }
            | EditKind::Attribute { id, .. }
            | EditKind::ZOrder { id, .. } => Some(*id),
            EditKind::Composite(_) => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.state == EditState::Done && self.kind_allows_undo_redo()
    }

    pub fn can_redo(&self) -> bool {
        self.state == EditState::Undone && self.kind_allows_undo_redo()
    }

    fn kind_allows_undo_redo(&self) -> bool {
        match &self.kind {
            EditKind::Composite(c) => !c.is_open(),
            _ => true,
        }
    }

    pub fn undo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        if let EditKind::Composite(c) = &self.kind
            && c.is_open()
        {
            return Err(EditError::CompositeOpen);
        }
        if self.state != EditState::Done {
            return Err(EditError::CannotUndo(self.label.to_string()));
        }
        match &mut self.kind {
            EditKind::AddFigure { id, figure, .. } => {
                *figure = Some(drawing.remove(*id).ok_or(EditError::MissingFigure(*id))?);
            }
            EditKind::RemoveFigure { id, index, figure } => {
                let f = figure.take().ok_or(EditError::MissingFigure(*id))?;
                drawing.add_at(*index, f);
            }
            EditKind::Geometry { id, before, .. } => {
                restore(drawing, *id, before)?;
            }
            EditKind::Attribute { id, key, before, .. } => {
                if !drawing.set_attribute(*id, *key, before.clone()) {
                    return Err(EditError::MissingFigure(*id));
                }
            }
            EditKind::ZOrder { id, before, .. } => {
                drawing.move_to(*id, *before).ok_or(EditError::MissingFigure(*id))?;
            }
            EditKind::Composite(c) => c.undo(drawing)?,
        }
        self.state = EditState::Undone;
        Ok(())
    }

    pub fn redo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        if let EditKind::Composite(c) = &self.kind
            && c.is_open()
        {
            return Err(EditError::CompositeOpen);
        }
        if self.state != EditState::Undone {
            return Err(EditError::CannotRedo(self.label.to_string()));
        }
        match &mut self.kind {
            EditKind::AddFigure { id, index, figure } => {
                let f = figure.take().ok_or(EditError::MissingFigure(*id))?;
                drawing.add_at(*index, f);
            }
            EditKind::RemoveFigure { id, figure, .. } => {
                *figure = Some(drawing.remove(*id).ok_or(EditError::MissingFigure(*id))?);
            }
            EditKind::Geometry { id, after, .. } => {
                restore(drawing, *id, after)?;
            }
            EditKind::Attribute { id, key, after, .. } => {
                if !drawing.set_attribute(*id, *key, after.clone()) {
                    return Err(EditError::MissingFigure(*id));
                }
            }
            EditKind::ZOrder { id, after, .. } => {
                drawing.move_to(*id, *after).ok_or(EditError::MissingFigure(*id))?;
            }
            EditKind::Composite(c) => c.redo(drawing)?,
        }
        self.state = EditState::Done;
        Ok(())
    }

    // ─── Coalescing ──────────────────────────────────────────────────────

    /// Try to fold `next` into this edit. On success `next` is dead.
    pub fn add_edit(&mut self, next: &mut UndoableEdit) -> bool {
        if self.state != EditState::Done || next.state != EditState::Done {
            return false;
        }
        let absorbed = match (&mut self.kind, &next.kind) {
            (EditKind::Composite(c), _) if c.is_open() => {
                c.add_edit(next.clone());
                true
            }
            // A figure added and then changed in the same step: redo re-adds
            // it in its final state.
            (
                EditKind::AddFigure { id, .. },
                EditKind::Geometry { id: other, .. } | EditKind::Attribute { id: other, .. },
            ) => id == other,
            (
                EditKind::Geometry { id, after, .. },
                EditKind::Geometry {
                    id: other,
                    after: next_after,
                    ..
                },
            ) if id == other => {
                *after = next_after.clone();
                true
            }
            (
                EditKind::Attribute { id, key, after, .. },
                EditKind::Attribute {
                    id: other,
                    key: other_key,
                    after: next_after,
                    ..
                },
            ) if id == other && key == other_key => {
                *after = next_after.clone();
                true
            }
            _ => false,
        };
        if absorbed {
            self.significant |= next.significant;
            next.state = EditState::Dead;
        }
        absorbed
    }

    /// Try to supersede `prev`. On success `prev` is dead and this edit takes
    /// over its starting state.
    pub fn replace_edit(&mut self, prev: &mut UndoableEdit) -> bool {
        if self.state != EditState::Done || prev.state != EditState::Done {
            return false;
        }
        let replaced = match (&mut self.kind, &prev.kind) {
            (
                EditKind::ZOrder { id, before, .. },
                EditKind::ZOrder {
                    id: other,
                    before: prev_before,
                    ..
                },
            ) if id == other => {
                *before = *prev_before;
                true
            }
            _ => false,
        };
        if replaced {
            prev.state = EditState::Dead;
        }
        replaced
    }

    /// Close an open composite. No-op for other kinds.
    pub(crate) fn close(&mut self) {
        if let EditKind::Composite(c) = &mut self.kind {
            c.close();
        }
    }
}

fn restore(drawing: &mut dyn Drawing, id: FigureId, g: &FigureGeometry) -> Result<(), EditError> {
    if drawing.update_figure(id, &mut |f| f.restore_geometry(g)) {
        Ok(())
    } else {
        Err(EditError::MissingFigure(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DefaultDrawing;
    use crate::figure::Boundable;
    use kurbo::{Affine, Rect};
    use pretty_assertions::assert_eq;

    #[test]
    fn undo_twice_is_an_error() {
        let mut d = DefaultDrawing::new();
        let id = d.add(Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let mut edits = d.take_edits();
        let edit = &mut edits[0];

        edit.undo(&mut d).unwrap();
        assert!(!d.contains(id));
        assert_eq!(
            edit.undo(&mut d),
            Err(EditError::CannotUndo("Add Figure".into()))
        );
        edit.redo(&mut d).unwrap();
        assert!(d.contains(id));
        assert_eq!(
            edit.redo(&mut d),
            Err(EditError::CannotRedo("Add Figure".into()))
        );
    }

    #[test]
    fn geometry_edits_coalesce() {
        let mut d = DefaultDrawing::new();
        let id = d.basic_add(Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        d.transform_figures(&[id], Affine::translate((1.0, 0.0)));
        d.transform_figures(&[id], Affine::translate((0.0, 2.0)));
        let mut edits = d.take_edits();
        assert_eq!(edits.len(), 2);

        let (first, rest) = edits.split_at_mut(1);
        assert!(first[0].add_edit(&mut rest[0]));
        assert_eq!(rest[0].state(), EditState::Dead);

        first[0].undo(&mut d).unwrap();
        assert_eq!(d.figure(id).unwrap().bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
        first[0].redo(&mut d).unwrap();
        assert_eq!(d.figure(id).unwrap().bounds(), Rect::new(1.0, 2.0, 11.0, 12.0));
    }

    #[test]
    fn z_order_replaces_previous() {
        let a = FigureId::next();
        let mut first = UndoableEdit::z_order(a, 0, 2);
        let mut second = UndoableEdit::z_order(a, 2, 1);
        assert!(!first.add_edit(&mut second));
        assert!(second.replace_edit(&mut first));
        assert_eq!(first.state(), EditState::Dead);
        match second.kind {
            EditKind::ZOrder { before, after, .. } => assert_eq!((before, after), (0, 1)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn different_figures_do_not_coalesce() {
        let mut a = UndoableEdit::attribute(
            FigureId::next(),
            AttributeKey::Layer,
            None,
            Some(AttributeValue::Number(1.0)),
        );
        let mut b = UndoableEdit::attribute(
            FigureId::next(),
            AttributeKey::Layer,
            None,
            Some(AttributeValue::Number(2.0)),
        );
        assert!(!a.add_edit(&mut b));
        assert!(!b.replace_edit(&mut a));
        assert_eq!(b.state(), EditState::Done);
    }
}
