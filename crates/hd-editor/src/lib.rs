pub mod actions;
pub mod config;
pub mod constrainer;
pub mod editor;
pub mod error;
pub mod handle;
pub mod input;
pub mod shortcuts;
pub mod tools;
pub mod view;
pub mod worker;

pub use actions::{EditorAction, ViewFlag, ViewProperty};
pub use config::{EditorConfig, GridConfig};
pub use constrainer::GridConstrainer;
pub use editor::DrawingEditor;
pub use error::EditorError;
pub use handle::{Handle, HandleContext, HandleKind};
pub use input::{InputEvent, Modifiers};
pub use shortcuts::ShortcutMap;
pub use tools::{
    ConnectionTool, CreationTool, FigureTemplate, SelectionTool, Tool, ToolContext, ToolKind,
    ToolOutcome, ToolState,
};
pub use view::{DrawingView, ViewTransform};
pub use worker::{Completion, PendingJob};
