//! The connection tool: drag from one connectable figure to another.

use super::{Tool, ToolContext, ToolKind, ToolOutcome, ToolState};
use crate::handle::{ConnectionTracker, find_target};
use crate::input::InputEvent;
use std::collections::HashSet;

pub struct ConnectionTool {
    state: ToolState,
    tracker: Option<ConnectionTracker>,
    sticky: bool,
}

impl Default for ConnectionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTool {
    pub fn new() -> Self {
        Self {
            state: ToolState::Inactive,
            tracker: None,
            sticky: false,
        }
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }
}

impl Tool for ConnectionTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect {
            sticky: self.sticky,
        }
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
            InputEvent::PointerDown { point, .. } => {
                self.cancel(ctx);
                let p = ctx.to_drawing(*point);
                // Connections start on a connector, never in empty space
                let Some((_, start)) = find_target(ctx.drawing, p, &HashSet::new()) else {
                    return ToolOutcome::Ignored;
                };
                self.tracker = ConnectionTracker::start(ctx.drawing, start, p);
                if self.tracker.is_some() {
                    self.state = ToolState::Tracking;
                }
                ToolOutcome::Handled
            }
            InputEvent::PointerMove { point, .. } => {
                let Some(t) = &mut self.tracker else {
                    return ToolOutcome::Ignored;
                };
                let lead = ctx.to_drawing(*point);
                t.step(ctx.drawing, lead);
                ToolOutcome::Handled
            }
            InputEvent::PointerUp { point, .. } => {
                let Some(t) = self.tracker.take() else {
                    return ToolOutcome::Ignored;
                };
                self.state = ToolState::Active;
                let lead = ctx.to_drawing(*point);
                match t.finish(&mut ctx.handle_context(), lead) {
                    Some(id) => {
                        ctx.view.select(id);
                        if self.sticky {
                            ToolOutcome::Handled
                        } else {
                            ToolOutcome::Done
                        }
                    }
                    None => ToolOutcome::Handled,
                }
            }
            InputEvent::Key { .. } => ToolOutcome::Ignored,
        }
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(t) = self.tracker.take() {
            t.cancel(ctx.drawing);
            self.state = ToolState::Active;
        }
    }
}
