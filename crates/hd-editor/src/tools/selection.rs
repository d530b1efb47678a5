//! The selection tool: select, move, and manipulate handles.

use super::tracker::{DragTracker, HandleTracker, SelectAreaTracker};
use super::{Tool, ToolContext, ToolKind, ToolOutcome, ToolState};
use crate::input::{InputEvent, Modifiers};
use kurbo::Point;

/// The gesture in progress.
enum Tracker {
    Handle(HandleTracker),
    Drag(DragTracker),
    Area(SelectAreaTracker),
}

pub struct SelectionTool {
    state: ToolState,
    tracker: Option<Tracker>,
}

impl Default for SelectionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTool {
    pub fn new() -> Self {
        Self {
            state: ToolState::Inactive,
            tracker: None,
        }
    }

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, view_point: Point, m: Modifiers) {
        let p = ctx.to_drawing(view_point);

        if let Some(handle) = ctx.view.find_handle(ctx.drawing, view_point) {
            self.tracker = Some(Tracker::Handle(HandleTracker::start(ctx, handle, p, m)));
            return;
        }

        if let Some(hit) = ctx.drawing.find_figure(p) {
            if m.shift() {
                // Shift+click: toggle the figure in or out of the selection
                ctx.view.toggle_selection(hit);
            } else if !ctx.view.is_selected(hit) {
                ctx.view.select(hit);
            }
            // A figure just deselected with shift is not dragged
            if ctx.view.is_selected(hit) {
                self.tracker = Some(Tracker::Drag(DragTracker::start(ctx, p)));
            }
            return;
        }

        self.tracker = Some(Tracker::Area(SelectAreaTracker::start(ctx, p, m.shift())));
    }
}

impl Tool for SelectionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn state(&self) -> ToolState {
        self.state
    }

    fn activate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.state = ToolState::Active;
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.cancel(ctx);
        self.state = ToolState::Inactive;
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> ToolOutcome {
        match event {
            InputEvent::PointerDown { point, modifiers } => {
                if self.tracker.is_some() {
                    // A lost pointer-up; drop the old gesture first
                    self.cancel(ctx);
                }
                self.pointer_down(ctx, *point, *modifiers);
                self.state = if self.tracker.is_some() {
                    ToolState::Tracking
                } else {
                    ToolState::Active
                };
                ToolOutcome::Handled
            }
            InputEvent::PointerMove { point, modifiers } => {
                let lead = ctx.to_drawing(*point);
                match &mut self.tracker {
                    Some(Tracker::Handle(t)) => t.step(ctx, lead, *modifiers),
                    Some(Tracker::Drag(t)) => t.step(ctx, lead, *modifiers),
                    Some(Tracker::Area(t)) => t.step(ctx, lead),
                    None => return ToolOutcome::Ignored,
                }
                ToolOutcome::Handled
            }
            InputEvent::PointerUp { point, modifiers } => {
                let lead = ctx.to_drawing(*point);
                let Some(tracker) = self.tracker.take() else {
                    return ToolOutcome::Ignored;
                };
                match tracker {
                    Tracker::Handle(t) => t.end(ctx, lead, *modifiers),
                    Tracker::Drag(t) => t.end(ctx, lead, *modifiers),
                    Tracker::Area(t) => t.end(ctx, lead),
                }
                ctx.view.prune_selection(ctx.drawing);
                self.state = ToolState::Active;
                ToolOutcome::Handled
            }
            InputEvent::Key { .. } => ToolOutcome::Ignored,
        }
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        match self.tracker.take() {
            Some(Tracker::Handle(t)) => t.cancel(ctx),
            Some(Tracker::Drag(t)) => t.cancel(ctx),
            Some(Tracker::Area(t)) => t.cancel(ctx),
            None => return,
        }
        if self.state == ToolState::Tracking {
            self.state = ToolState::Active;
        }
    }
}
