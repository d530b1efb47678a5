//! Tool system for canvas interactions.
//!
//! The editor routes every pointer event to exactly one active tool. A tool
//! is inactive until the editor activates it, active while it waits for
//! input, and tracking from pointer-down to pointer-up.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Selection Tool | Creation Tool | Connection Tool |
//! |----------|----------------|---------------|-----------------|
//! | **Shift** | Toggle selection, axis-constrain drag, add to area selection | n/a | n/a |

mod connection;
mod creation;
mod selection;
mod tracker;

pub use connection::ConnectionTool;
pub use creation::{CreationTool, FigureTemplate};
pub use selection::SelectionTool;

use crate::handle::HandleContext;
use crate::input::InputEvent;
use crate::view::DrawingView;
use hd_core::{AttributeKey, AttributeValue, Drawing, UndoRedoManager};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Everything a tool may touch while handling one event.
pub struct ToolContext<'a> {
    pub drawing: &'a mut dyn Drawing,
    pub view: &'a mut DrawingView,
    pub undo: &'a mut UndoRedoManager,
}

impl ToolContext<'_> {
    pub fn handle_context(&mut self) -> HandleContext<'_> {
        HandleContext {
            constrainer: self.view.constrainer(),
            drawing: &mut *self.drawing,
            undo: &mut *self.undo,
        }
    }

    /// Map a view-space pointer position into the drawing.
    pub fn to_drawing(&self, p: Point) -> Point {
        self.view.view_to_drawing(p)
    }

    /// Map into the drawing and snap to the grid if snapping is on.
    pub fn to_drawing_constrained(&self, p: Point) -> Point {
        let p = self.to_drawing(p);
        self.view
            .constrainer()
            .map_or(p, |g| g.constrain_point(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    Inactive,
    Active,
    Tracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool did not use the event.
    Ignored,
    Handled,
    /// The tool finished its job; the editor may switch back to selection.
    Done,
}

/// Selects a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolKind {
    Select,
    Create {
        template: FigureTemplate,
        /// Set on every figure the tool creates.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attributes: Vec<(AttributeKey, AttributeValue)>,
        /// Stay active after each figure instead of handing back to selection.
        #[serde(default)]
        sticky: bool,
    },
    Connect {
        #[serde(default)]
        sticky: bool,
    },
}

impl ToolKind {
    pub fn create(&self) -> Box<dyn Tool> {
        match self {
            ToolKind::Select => Box::new(SelectionTool::new()),
            ToolKind::Create {
                template,
                attributes,
                sticky,
            } => {
                let tool = attributes.iter().fold(
                    CreationTool::new(template.clone()).sticky(*sticky),
                    |tool, (key, value)| tool.with_attribute(*key, value.clone()),
                );
                Box::new(tool)
            }
            ToolKind::Connect { sticky } => Box::new(ConnectionTool::new().sticky(*sticky)),
        }
    }

    pub fn creating(template: FigureTemplate) -> Self {
        ToolKind::Create {
            template,
            attributes: Vec::new(),
            sticky: false,
        }
    }

    pub fn connecting() -> Self {
        ToolKind::Connect { sticky: false }
    }
}


/// Trait for tools that turn input events into drawing changes.
pub trait Tool: Send {
    fn kind(&self) -> ToolKind;
    fn state(&self) -> ToolState;

    fn activate(&mut self, ctx: &mut ToolContext<'_>);

    /// Leave the tool, abandoning any gesture in progress.
    fn deactivate(&mut self, ctx: &mut ToolContext<'_>);

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> ToolOutcome;

    /// Abandon the gesture in progress, restoring the drawing.
    fn cancel(&mut self, ctx: &mut ToolContext<'_>);
}
