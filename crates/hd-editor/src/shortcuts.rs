//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to [`EditorAction`]s. `cmd` means Ctrl or ⌘,
//! whichever the platform reports.
//!
//! - Tab toggles between the two most recent tools
//! - Shift adds to a binding (⌘Z undoes, ⇧⌘Z redoes)
//! - Escape abandons the gesture in progress

use crate::actions::{EditorAction, ViewFlag};
use crate::input::Modifiers;
use crate::tools::{FigureTemplate, ToolKind};

/// Resolves key events into editor actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the key's name (e.g. `"z"`, `"Delete"`). Returns `None` if
    /// the combo has no binding.
    pub fn resolve(key: &str, m: Modifiers) -> Option<EditorAction> {
        let cmd = m.command();

        // ── Modifier combos first (most specific) ──
        if cmd && m.shift() {
            return match key {
                "z" | "Z" => Some(EditorAction::Redo),
                "g" | "G" => Some(EditorAction::Ungroup),
                "[" | "{" => Some(EditorAction::SendToBack),
                "]" | "}" => Some(EditorAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(EditorAction::Undo),
                "y" | "Y" => Some(EditorAction::Redo),
                "a" | "A" => Some(EditorAction::SelectAll),
                "d" | "D" => Some(EditorAction::Duplicate),
                "g" | "G" => Some(EditorAction::Group),
                "=" | "+" => Some(EditorAction::ZoomIn),
                "-" => Some(EditorAction::ZoomOut),
                "'" => Some(EditorAction::ToggleProperty(ViewFlag::GridVisible)),
                ";" => Some(EditorAction::ToggleProperty(ViewFlag::SnapToGrid)),
                _ => None,
            };
        }

        if m.shift() || m.alt() {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(EditorAction::SelectTool(ToolKind::Select)),
            "r" | "R" => Some(EditorAction::SelectTool(ToolKind::creating(
                FigureTemplate::Rectangle,
            ))),
            "o" | "O" => Some(EditorAction::SelectTool(ToolKind::creating(
                FigureTemplate::Ellipse,
            ))),
            "l" | "L" => Some(EditorAction::SelectTool(ToolKind::creating(
                FigureTemplate::Line,
            ))),
            "t" | "T" => Some(EditorAction::SelectTool(ToolKind::creating(
                FigureTemplate::Text {
                    text: "Text".into(),
                },
            ))),
            "c" | "C" => Some(EditorAction::SelectTool(ToolKind::connecting())),
            "Tab" => Some(EditorAction::ToggleLastTool),
            "Delete" | "Backspace" => Some(EditorAction::Delete),
            "Escape" => Some(EditorAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NONE: Modifiers = Modifiers::empty();

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", NONE),
            Some(EditorAction::SelectTool(ToolKind::Select))
        );
        assert_eq!(
            ShortcutMap::resolve("o", NONE),
            Some(EditorAction::SelectTool(ToolKind::creating(
                FigureTemplate::Ellipse
            )))
        );
        assert_eq!(
            ShortcutMap::resolve("c", NONE),
            Some(EditorAction::SelectTool(ToolKind::connecting()))
        );
        assert_eq!(ShortcutMap::resolve("Tab", NONE), Some(EditorAction::ToggleLastTool));
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", Modifiers::META),
            Some(EditorAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", Modifiers::CTRL),
            Some(EditorAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", Modifiers::META | Modifiers::SHIFT),
            Some(EditorAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", Modifiers::CTRL),
            Some(EditorAction::Redo)
        );
    }

    #[test]
    fn resolve_delete_and_cancel() {
        assert_eq!(ShortcutMap::resolve("Delete", NONE), Some(EditorAction::Delete));
        assert_eq!(
            ShortcutMap::resolve("Backspace", NONE),
            Some(EditorAction::Delete)
        );
        assert_eq!(ShortcutMap::resolve("Escape", NONE), Some(EditorAction::Cancel));
    }

    #[test]
    fn resolve_structure_and_z_order() {
        let cmd = Modifiers::CTRL;
        let cmd_shift = Modifiers::CTRL | Modifiers::SHIFT;
        assert_eq!(ShortcutMap::resolve("g", cmd), Some(EditorAction::Group));
        assert_eq!(ShortcutMap::resolve("g", cmd_shift), Some(EditorAction::Ungroup));
        assert_eq!(ShortcutMap::resolve("d", cmd), Some(EditorAction::Duplicate));
        assert_eq!(
            ShortcutMap::resolve("[", cmd_shift),
            Some(EditorAction::SendToBack)
        );
        assert_eq!(
            ShortcutMap::resolve("]", cmd_shift),
            Some(EditorAction::BringToFront)
        );
    }

    #[test]
    fn unbound_combos_resolve_to_none() {
        assert_eq!(ShortcutMap::resolve("q", NONE), None);
        assert_eq!(ShortcutMap::resolve("v", Modifiers::SHIFT), None);
        assert_eq!(ShortcutMap::resolve("r", Modifiers::ALT), None);
        assert_eq!(ShortcutMap::resolve("q", Modifiers::META), None);
    }
}
