//! Rendering sink consumed by figures and drawings.
//!
//! Figures describe themselves as kurbo paths; how those reach pixels is up
//! to the implementation (SVG export, a GPU scene, or the recorder below).

use crate::attribute::Color;
use crate::id::FigureId;
use kurbo::{BezPath, Point, Rect};

pub trait Graphics {
    fn fill_path(&mut self, path: &BezPath, color: Color);
    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64);
    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color);
    /// Restrict subsequent drawing to `clip` until the matching `pop_clip`.
    fn push_clip(&mut self, clip: Rect);
    fn pop_clip(&mut self);

    /// Called by the drawing around each top-level figure it paints.
    fn begin_figure(&mut self, _id: FigureId) {}
    fn end_figure(&mut self, _id: FigureId) {}
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill { path: BezPath, color: Color },
    Stroke { path: BezPath, color: Color, width: f64 },
    Text { origin: Point, text: String, font_size: f64, color: Color },
    PushClip(Rect),
    PopClip,
    BeginFigure(FigureId),
    EndFigure(FigureId),
}

/// Headless sink that records every call.
#[derive(Debug, Default, Clone)]
pub struct RecordingGraphics {
    pub commands: Vec<DrawCommand>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level figures in the order they were painted.
    pub fn figure_order(&self) -> Vec<FigureId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginFigure(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl Graphics for RecordingGraphics {
    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            color,
            width,
        });
    }

    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color) {
        self.commands.push(DrawCommand::Text {
            origin,
            text: text.to_string(),
            font_size,
            color,
        });
    }

    fn push_clip(&mut self, clip: Rect) {
        self.commands.push(DrawCommand::PushClip(clip));
    }

    fn pop_clip(&mut self) {
        self.commands.push(DrawCommand::PopClip);
    }

    fn begin_figure(&mut self, id: FigureId) {
        self.commands.push(DrawCommand::BeginFigure(id));
    }

    fn end_figure(&mut self, id: FigureId) {
        self.commands.push(DrawCommand::EndFigure(id));
    }
}
