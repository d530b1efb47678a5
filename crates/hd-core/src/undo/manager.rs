//! Undo/redo history with transactional grouping.
//!
//! Edits reach the manager either directly through [`UndoRedoManager::add_edit`]
//! or by draining a drawing's queue with [`UndoRedoManager::absorb`]. Between
//! [`begin`](UndoRedoManager::begin) and the matching
//! [`end`](UndoRedoManager::end) they collect into one [`CompositeEdit`], and
//! compatible edits on the same figure coalesce, so a whole drag gesture
//! becomes a single undo step.

use crate::drawing::Drawing;
use crate::error::EditError;
use crate::undo::composite::CompositeEdit;
use crate::undo::edit::{EditKind, UndoableEdit};
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

/// Scope token for an open composite. Must be handed back to
/// [`UndoRedoManager::end`].
#[must_use = "an open composite blocks undo until its token is passed to `end`"]
#[derive(Debug, PartialEq, Eq)]
pub struct CompositeToken(u64);

pub struct UndoRedoManager {
    undo_stack: Vec<UndoableEdit>,
    redo_stack: Vec<UndoableEdit>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Open composites, innermost last.
    open: Vec<(u64, CompositeEdit)>,
    next_token: u64,
    has_significant_edits: bool,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new(100)
    }
}

impl std::fmt::Debug for UndoRedoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoRedoManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("open", &self.open.len())
            .field("has_significant_edits", &self.has_significant_edits)
            .finish()
    }
}

impl UndoRedoManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(1024)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            open: Vec::new(),
            next_token: 0,
            has_significant_edits: false,
        }
    }

    // ─── Composites ──────────────────────────────────────────────────────

    /// Open a composite. Edits recorded until the matching `end` form one
    /// undo step. Composites nest.
    pub fn begin(&mut self, label: impl Into<Cow<'static, str>>) -> CompositeToken {
        self.next_token += 1;
        let composite = CompositeEdit::new(label);
        log::trace!("begin composite {:?} (depth {})", composite.label(), self.open.len() + 1);
        self.open.push((self.next_token, composite));
        CompositeToken(self.next_token)
    }

    /// Close the innermost composite. `token` must be the one `begin`
    /// returned for it.
    pub fn end(&mut self, token: CompositeToken) -> Result<(), EditError> {
        match self.open.last() {
            Some((t, _)) if *t == token.0 => {}
            _ => {
                log::warn!("composite token {} ended out of order", token.0);
                return Err(EditError::UnbalancedComposite);
            }
        }
        let Some((_, mut composite)) = self.open.pop() else {
            return Err(EditError::UnbalancedComposite);
        };
        composite.close();
        if composite.is_empty() {
            log::trace!("dropping empty composite {:?}", composite.label());
            return Ok(());
        }
        let label = composite.label().to_string();
        let mut edit = UndoableEdit::new(EditKind::Composite(composite), label);
        edit.close();
        self.add_edit(edit);
        Ok(())
    }

    /// Open a composite that closes when the guard drops.
    pub fn guard(&mut self, label: impl Into<Cow<'static, str>>) -> CompositeGuard<'_> {
        let token = self.begin(label);
        CompositeGuard {
            manager: self,
            token: Some(token),
        }
    }

    /// Run `f` inside a composite, collecting the edits it leaves queued on
    /// `drawing`. The composite closes on every exit path of `f`.
    pub fn scoped<R>(
        &mut self,
        drawing: &mut dyn Drawing,
        label: impl Into<Cow<'static, str>>,
        f: impl FnOnce(&mut dyn Drawing) -> R,
    ) -> R {
        let mut guard = self.guard(label);
        let result = f(drawing);
        guard.absorb(drawing);
        result
    }

    pub fn is_in_composite(&self) -> bool {
        !self.open.is_empty()
    }

    // ─── Recording ───────────────────────────────────────────────────────

    /// Record an edit: into the innermost open composite, or onto the undo
    /// stack (dropping the redo stack).
    pub fn add_edit(&mut self, edit: UndoableEdit) {
        if let Some((_, composite)) = self.open.last_mut() {
            composite.add_edit(edit);
            return;
        }
        self.has_significant_edits |= edit.is_significant();
        log::trace!("record edit {:?}", edit.label());
        self.undo_stack.push(edit);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Record every edit `drawing` has queued.
    pub fn absorb(&mut self, drawing: &mut dyn Drawing) {
        for edit in drawing.take_edits() {
            self.add_edit(edit);
        }
    }

    // ─── Undo & Redo ─────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.open.is_empty() && self.undo_stack.last().is_some_and(UndoableEdit::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.open.is_empty() && self.redo_stack.last().is_some_and(UndoableEdit::can_redo)
    }

    /// Undo the most recent step. Edits the drawing queues while undoing are
    /// dropped.
    pub fn undo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        if self.is_in_composite() {
            log::warn!("undo requested while a composite is open");
            return Err(EditError::CompositeOpen);
        }
        let Some(mut edit) = self.undo_stack.pop() else {
            log::warn!("undo requested with an empty history");
            return Err(EditError::CannotUndo(String::new()));
        };
        let result = edit.undo(drawing);
        let dropped = drawing.take_edits().len();
        log::trace!("undo {:?}: dropped {} side-effect edits", edit.label(), dropped);
        match result {
            Ok(()) => {
                self.has_significant_edits |= edit.is_significant();
                self.redo_stack.push(edit);
                Ok(())
            }
            Err(e) => {
                log::warn!("undo {:?} failed: {e}", edit.label());
                self.undo_stack.push(edit);
                Err(e)
            }
        }
    }

    pub fn redo(&mut self, drawing: &mut dyn Drawing) -> Result<(), EditError> {
        if self.is_in_composite() {
            log::warn!("redo requested while a composite is open");
            return Err(EditError::CompositeOpen);
        }
        let Some(mut edit) = self.redo_stack.pop() else {
            log::warn!("redo requested with nothing to redo");
            return Err(EditError::CannotRedo(String::new()));
        };
        let result = edit.redo(drawing);
        let dropped = drawing.take_edits().len();
        log::trace!("redo {:?}: dropped {} side-effect edits", edit.label(), dropped);
        match result {
            Ok(()) => {
                self.has_significant_edits |= edit.is_significant();
                self.undo_stack.push(edit);
                Ok(())
            }
            Err(e) => {
                log::warn!("redo {:?} failed: {e}", edit.label());
                self.redo_stack.push(edit);
                Err(e)
            }
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Forget all history, e.g. after loading a document.
    pub fn discard_all_edits(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open.clear();
        self.has_significant_edits = false;
    }

    pub fn has_significant_edits(&self) -> bool {
        self.has_significant_edits
    }

    /// Clear the unsaved-changes flag without dropping history.
    pub fn mark_saved(&mut self) {
        self.has_significant_edits = false;
    }

    pub fn undo_presentation_name(&self) -> String {
        match self.undo_stack.last() {
            Some(e) if !e.label().is_empty() => format!("Undo {}", e.label()),
            _ => "Undo".to_string(),
        }
    }

    pub fn redo_presentation_name(&self) -> String {
        match self.redo_stack.last() {
            Some(e) if !e.label().is_empty() => format!("Redo {}", e.label()),
            _ => "Redo".to_string(),
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn history(&self) -> &[UndoableEdit] {
        &self.undo_stack
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Closes its composite when dropped.
pub struct CompositeGuard<'a> {
    manager: &'a mut UndoRedoManager,
    token: Option<CompositeToken>,
}

impl Deref for CompositeGuard<'_> {
    type Target = UndoRedoManager;

    fn deref(&self) -> &UndoRedoManager {
        self.manager
    }
}

impl DerefMut for CompositeGuard<'_> {
    fn deref_mut(&mut self) -> &mut UndoRedoManager {
        self.manager
    }
}

impl Drop for CompositeGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take()
            && let Err(e) = self.manager.end(token)
        {
            log::warn!("closing composite on drop: {e}");
        }
    }
}
