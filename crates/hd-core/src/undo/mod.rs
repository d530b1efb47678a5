//! Edit log: reversible edits, composites and the undo/redo manager.

mod composite;
mod edit;
mod manager;

pub use composite::CompositeEdit;
pub use edit::{EditKind, EditState, UndoableEdit};
pub use manager::{CompositeGuard, CompositeToken, UndoRedoManager};
