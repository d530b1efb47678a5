//! Editor actions: the commands menus and shortcuts trigger.
//!
//! Every action that changes the drawing runs inside one composite edit, so
//! it undoes in a single step. Actions are disabled while the view is
//! disabled, which covers background load and save.

use crate::editor::DrawingEditor;
use crate::error::EditorError;
use crate::tools::{ToolContext, ToolKind, ToolState};
use hd_core::{Boundable, Drawing, EditError, Figure, FigureId, FigureKind};
use kurbo::{Affine, Vec2};
use std::collections::{HashMap, HashSet};

/// Offset applied to duplicated figures so the copy does not hide the
/// original.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(10.0, 10.0);

/// Scale factor of one zoom step.
pub const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    Undo,
    Redo,
    /// Delete the selection along with the connections attached to it.
    Delete,
    SelectAll,
    ClearSelection,
    Duplicate,
    BringToFront,
    SendToBack,
    Group,
    Ungroup,
    SelectTool(ToolKind),
    /// Switch back to the previously active tool.
    ToggleLastTool,
    SetProperty(ViewProperty),
    ToggleProperty(ViewFlag),
    /// Abandon the gesture in progress, or clear the selection if idle.
    Cancel,
    ZoomIn,
    ZoomOut,
}

/// A view property set to an explicit value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewProperty {
    Scale(f64),
    GridVisible(bool),
    SnapToGrid(bool),
}

/// A boolean view property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFlag {
    GridVisible,
    SnapToGrid,
}

impl DrawingEditor {
    /// Whether `action` would do anything right now.
    pub fn is_action_enabled(&self, action: &EditorAction) -> bool {
        let view = self.view();
        if !view.is_enabled() {
            return false;
        }
        let drawing = self.drawing().lock();
        let selected = || view.selection().iter().filter_map(|id| drawing.figure(*id));
        match action {
            EditorAction::Undo => self.undo().can_undo(),
            EditorAction::Redo => self.undo().can_redo(),
            EditorAction::Delete
            | EditorAction::ClearSelection
            | EditorAction::Duplicate
            | EditorAction::BringToFront
            | EditorAction::SendToBack => !view.selection().is_empty(),
            EditorAction::SelectAll => drawing.figure_count() > 0,
            EditorAction::Group => selected().filter(|f| !f.is_connection()).count() >= 2,
            EditorAction::Ungroup => {
                selected().any(|f| matches!(f.kind, FigureKind::Group { .. }))
            }
            EditorAction::SelectTool(_)
            | EditorAction::ToggleLastTool
            | EditorAction::SetProperty(_)
            | EditorAction::ToggleProperty(_)
            | EditorAction::Cancel
            | EditorAction::ZoomIn
            | EditorAction::ZoomOut => true,
        }
    }

    /// Run `action`. Returns false if it was disabled.
    pub fn perform(&mut self, action: EditorAction) -> Result<bool, EditorError> {
        if !self.is_action_enabled(&action) {
            log::debug!("{action:?} is disabled");
            return Ok(false);
        }
        log::debug!("perform {action:?}");
        match action {
            EditorAction::SelectTool(kind) => self.set_tool(kind),
            EditorAction::ToggleLastTool => {
                let kind = self.previous_tool();
                self.set_tool(kind);
            }
            EditorAction::SetProperty(p) => self.set_property(p),
            EditorAction::ToggleProperty(flag) => {
                let view = self.view();
                let p = match flag {
                    ViewFlag::GridVisible => {
                        ViewProperty::GridVisible(!view.grid().is_some_and(|g| g.visible))
                    }
                    ViewFlag::SnapToGrid => ViewProperty::SnapToGrid(!view.is_snapping()),
                };
                self.set_property(p);
            }
            EditorAction::ZoomIn => {
                let scale = self.view().transform().scale * ZOOM_STEP;
                self.set_property(ViewProperty::Scale(scale));
            }
            EditorAction::ZoomOut => {
                let scale = self.view().transform().scale / ZOOM_STEP;
                self.set_property(ViewProperty::Scale(scale));
            }
            EditorAction::Cancel => self.with_context(|tool, ctx| {
                if tool.state() == ToolState::Tracking {
                    tool.cancel(ctx);
                } else {
                    ctx.view.clear_selection();
                }
            }),
            edit => self.with_context(|tool, ctx| {
                if tool.state() == ToolState::Tracking {
                    tool.cancel(ctx);
                }
                apply(edit, ctx)
            })?,
        }
        Ok(true)
    }

    fn set_property(&mut self, p: ViewProperty) {
        let view = self.view_mut();
        match p {
            ViewProperty::Scale(s) => view.set_scale(s),
            ViewProperty::GridVisible(v) => view.set_grid_visible(v),
            ViewProperty::SnapToGrid(v) => view.set_snap_to_grid(v),
        }
    }
}

// ─── Drawing Edits ───────────────────────────────────────────────────────

fn apply(action: EditorAction, ctx: &mut ToolContext<'_>) -> Result<(), EditError> {
    match action {
        EditorAction::Undo => {
            ctx.undo.undo(ctx.drawing)?;
            ctx.view.prune_selection(ctx.drawing);
        }
        EditorAction::Redo => {
            ctx.undo.redo(ctx.drawing)?;
            ctx.view.prune_selection(ctx.drawing);
        }
        EditorAction::SelectAll => ctx.view.select_all(ctx.drawing),
        EditorAction::ClearSelection => ctx.view.clear_selection(),
        EditorAction::Delete => delete(ctx),
        EditorAction::Duplicate => duplicate(ctx),
        EditorAction::BringToFront => {
            let ids = ctx.view.selection_in_z_order(ctx.drawing);
            ctx.undo.scoped(ctx.drawing, "Bring to Front", |d| {
                for id in ids {
                    d.bring_to_front(id);
                }
            });
        }
        EditorAction::SendToBack => {
            let ids = ctx.view.selection_in_z_order(ctx.drawing);
            ctx.undo.scoped(ctx.drawing, "Send to Back", |d| {
                // Back to front in reverse keeps the selection's own order
                for id in ids.into_iter().rev() {
                    d.send_to_back(id);
                }
            });
        }
        EditorAction::Group => group(ctx),
        EditorAction::Ungroup => ungroup(ctx),
        other => log::warn!("{other:?} does not edit the drawing"),
    }
    Ok(())
}

/// Selected ids in list order.
fn selection_in_list_order(ctx: &ToolContext<'_>) -> Vec<FigureId> {
    let mut ids: Vec<FigureId> = ctx
        .view
        .selection()
        .iter()
        .copied()
        .filter(|id| ctx.drawing.contains(*id))
        .collect();
    ids.sort_by_key(|id| ctx.drawing.index_of(*id));
    ids
}

fn delete(ctx: &mut ToolContext<'_>) {
    let selected = selection_in_list_order(ctx);
    let mut seen: HashSet<FigureId> = HashSet::new();
    let mut doomed: Vec<FigureId> = Vec::new();
    // Connections go first so undo restores their owners before them
    for id in &selected {
        let connections = if ctx.drawing.figure(*id).is_some_and(Figure::is_connection) {
            vec![*id]
        } else {
            ctx.drawing.dependent_connections(*id)
        };
        for c in connections {
            if seen.insert(c) {
                doomed.push(c);
            }
        }
    }
    for id in selected {
        if seen.insert(id) {
            doomed.push(id);
        }
    }
    ctx.undo.scoped(ctx.drawing, "Delete", |d| {
        for id in &doomed {
            d.remove(*id);
        }
    });
    ctx.view.clear_selection();
}

fn duplicate(ctx: &mut ToolContext<'_>) {
    let ids = ctx.view.selection_in_z_order(ctx.drawing);
    let mut map: HashMap<FigureId, FigureId> = HashMap::new();
    let mut copies: Vec<Figure> = ids
        .iter()
        .filter_map(|id| ctx.drawing.figure(*id))
        .map(|f| f.duplicate(&mut map))
        .collect();
    let offset = Affine::translate(DUPLICATE_OFFSET);
    for copy in &mut copies {
        copy.remap_connectors(&map);
        copy.transform(offset);
    }
    let added = ctx.undo.scoped(ctx.drawing, "Duplicate", |d| {
        copies.into_iter().map(|f| d.add(f)).collect::<Vec<_>>()
    });
    ctx.view.set_selection(added);
}

fn group(ctx: &mut ToolContext<'_>) {
    let ids: Vec<FigureId> = selection_in_list_order(ctx)
        .into_iter()
        .filter(|id| ctx.drawing.figure(*id).is_some_and(|f| !f.is_connection()))
        .collect();
    let Some(&front) = ids.last() else {
        return;
    };
    let Some(front_index) = ctx.drawing.index_of(front) else {
        return;
    };
    // The group takes the slot of its front-most member
    let index = front_index + 1 - ids.len();
    let group = ctx.undo.scoped(ctx.drawing, "Group", |d| {
        let children: Vec<Figure> = ids.iter().filter_map(|id| d.remove(*id)).collect();
        d.add_at(index, Figure::group(children))
    });
    ctx.view.set_selection([group]);
}

fn ungroup(ctx: &mut ToolContext<'_>) {
    let groups: Vec<FigureId> = selection_in_list_order(ctx)
        .into_iter()
        .filter(|id| {
            ctx.drawing
                .figure(*id)
                .is_some_and(|f| matches!(f.kind, FigureKind::Group { .. }))
        })
        .collect();
    let released = ctx.undo.scoped(ctx.drawing, "Ungroup", |d| {
        let mut released = Vec::new();
        // Front to back so earlier indices stay valid
        for id in groups.iter().rev() {
            released.extend(ungroup_one(d, *id));
        }
        released
    });
    ctx.view.set_selection(released);
}

fn ungroup_one(d: &mut dyn Drawing, id: FigureId) -> Vec<FigureId> {
    let Some(index) = d.index_of(id) else {
        return Vec::new();
    };
    let Some(group) = d.remove(id) else {
        return Vec::new();
    };
    let FigureKind::Group { children } = group.kind else {
        return Vec::new();
    };
    children
        .into_iter()
        .enumerate()
        .map(|(i, child)| d.add_at(index + i, child))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use hd_core::Rect;
    use pretty_assertions::assert_eq;

    fn editor_with(rects: &[Rect]) -> (DrawingEditor, Vec<FigureId>) {
        let mut editor = DrawingEditor::new(EditorConfig::default());
        let ids = {
            let mut d = editor.drawing().lock();
            let ids: Vec<FigureId> = rects.iter().map(|r| d.add(Figure::rectangle(*r))).collect();
            d.take_edits();
            ids
        };
        (editor, ids)
    }

    #[test]
    fn actions_follow_selection_and_history() {
        let (mut editor, ids) = editor_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert!(!editor.is_action_enabled(&EditorAction::Undo));
        assert!(!editor.is_action_enabled(&EditorAction::Delete));
        assert!(editor.is_action_enabled(&EditorAction::SelectAll));

        editor.view_mut().select(ids[0]);
        assert!(editor.is_action_enabled(&EditorAction::Delete));
        assert!(!editor.is_action_enabled(&EditorAction::Group));

        editor.view_mut().set_enabled(false);
        assert!(!editor.is_action_enabled(&EditorAction::Delete));
        assert!(!editor.perform(EditorAction::Delete).unwrap());
    }

    #[test]
    fn z_order_actions_are_single_steps() {
        let (mut editor, ids) = editor_with(&[
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 15.0, 15.0),
            Rect::new(20.0, 20.0, 30.0, 30.0),
        ]);
        editor.view_mut().set_selection([ids[0], ids[1]]);
        assert!(editor.perform(EditorAction::BringToFront).unwrap());
        assert_eq!(editor.drawing().lock().children(), &[ids[2], ids[0], ids[1]]);
        assert_eq!(editor.undo().undo_presentation_name(), "Undo Bring to Front");

        assert!(editor.perform(EditorAction::SendToBack).unwrap());
        assert_eq!(editor.drawing().lock().children(), &[ids[0], ids[1], ids[2]]);

        editor.perform(EditorAction::Undo).unwrap();
        assert_eq!(editor.drawing().lock().children(), &[ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn duplicate_offsets_copies_and_selects_them() {
        let (mut editor, ids) = editor_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        editor.view_mut().select(ids[0]);
        editor.perform(EditorAction::Duplicate).unwrap();

        let copy = editor.view().selection()[0];
        assert_ne!(copy, ids[0]);
        let d = editor.drawing().lock();
        assert_eq!(d.figure_count(), 2);
        assert_eq!(
            d.figure(copy).map(Boundable::bounds),
            Some(Rect::new(10.0, 10.0, 20.0, 20.0))
        );
    }

    #[test]
    fn zoom_and_grid_toggles() {
        let (mut editor, _) = editor_with(&[]);
        editor.perform(EditorAction::ZoomIn).unwrap();
        assert_eq!(editor.view().transform().scale, ZOOM_STEP);
        editor.perform(EditorAction::ZoomOut).unwrap();
        assert_eq!(editor.view().transform().scale, 1.0);

        assert!(!editor.view().is_snapping());
        editor
            .perform(EditorAction::ToggleProperty(ViewFlag::SnapToGrid))
            .unwrap();
        assert!(editor.view().is_snapping());
        editor
            .perform(EditorAction::ToggleProperty(ViewFlag::GridVisible))
            .unwrap();
        assert_eq!(editor.view().grid().map(|g| g.visible), Some(true));
    }

    #[test]
    fn tab_returns_to_previous_tool() {
        let (mut editor, _) = editor_with(&[]);
        editor.perform(EditorAction::SelectTool(ToolKind::connecting())).unwrap();
        assert_eq!(editor.tool_kind(), ToolKind::connecting());
        editor.perform(EditorAction::ToggleLastTool).unwrap();
        assert_eq!(editor.tool_kind(), ToolKind::Select);
        editor.perform(EditorAction::ToggleLastTool).unwrap();
        assert_eq!(editor.tool_kind(), ToolKind::connecting());
    }

    #[test]
    fn undo_manager_depth_comes_from_config() {
        let editor = DrawingEditor::new(EditorConfig {
            undo_limit: 3,
            ..EditorConfig::default()
        });
        assert_eq!(editor.undo().max_depth(), 3);
    }
}
