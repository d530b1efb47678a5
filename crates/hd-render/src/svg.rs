//! SVG export.
//!
//! [`SvgCanvas`] is a [`Graphics`] sink that writes each call as an SVG
//! element. [`render_svg`] wraps a whole drawing in a document sized to its
//! draw bounds.

use hd_core::{Color, Drawing, FigureId, Graphics};
use kurbo::{BezPath, Point, Rect};
use std::fmt::Write;

/// Margin around the drawing in exported documents.
pub const PADDING: f64 = 16.0;

/// Page used for an empty drawing.
const EMPTY_PAGE: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

fn svg_color(c: Color) -> String {
    let [r, g, b, _] = c.to_rgba8();
    if (c.a - 1.0).abs() < f32::EPSILON {
        format!("#{r:02X}{g:02X}{b:02X}")
    } else {
        format!("rgba({r}, {g}, {b}, {})", c.a)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Writes drawing calls as SVG elements.
#[derive(Debug, Default)]
pub struct SvgCanvas {
    body: String,
    depth: usize,
    next_clip: usize,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// The elements written so far, without the `<svg>` wrapper.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    fn line(&mut self, element: &str) {
        for _ in 0..=self.depth {
            self.body.push_str("  ");
        }
        self.body.push_str(element);
        self.body.push('\n');
    }
}

impl Graphics for SvgCanvas {
    fn fill_path(&mut self, path: &BezPath, color: Color) {
        let el = format!("<path d=\"{}\" fill=\"{}\" />", path.to_svg(), svg_color(color));
        self.line(&el);
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        let el = format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\" />",
            path.to_svg(),
            svg_color(color)
        );
        self.line(&el);
    }

    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color) {
        let el = format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"{font_size}\" fill=\"{}\" dominant-baseline=\"hanging\">{}</text>",
            origin.x,
            origin.y,
            svg_color(color),
            escape(text)
        );
        self.line(&el);
    }

    fn push_clip(&mut self, clip: Rect) {
        let id = self.next_clip;
        self.next_clip += 1;
        let el = format!(
            "<clipPath id=\"clip{id}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" /></clipPath>",
            clip.x0,
            clip.y0,
            clip.width(),
            clip.height()
        );
        self.line(&el);
        self.line(&format!("<g clip-path=\"url(#clip{id})\">"));
        self.depth += 1;
    }

    fn pop_clip(&mut self) {
        self.close_group();
    }

    fn begin_figure(&mut self, id: FigureId) {
        self.line(&format!("<g data-figure=\"{id}\">"));
        self.depth += 1;
    }

    fn end_figure(&mut self, _id: FigureId) {
        self.close_group();
    }
}

impl SvgCanvas {
    fn close_group(&mut self) {
        if self.depth == 0 {
            log::warn!("unbalanced group close in SVG output");
            return;
        }
        self.depth -= 1;
        self.line("</g>");
    }
}

/// Render every figure of `drawing` into a standalone SVG document.
pub fn render_svg(drawing: &mut dyn Drawing) -> String {
    let area = drawing.draw_bounds().unwrap_or(EMPTY_PAGE);
    let page = area.inflate(PADDING, PADDING);

    let mut canvas = SvgCanvas::new();
    drawing.draw(&mut canvas, area);

    let mut svg = String::new();
    let (w, h) = (page.width(), page.height());
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"{} {} {w} {h}\">",
        page.x0, page.y0
    );
    svg.push_str("<style>\n  text { font-family: Inter, system-ui, sans-serif; }\n</style>\n");
    svg.push_str(canvas.body());
    svg.push_str("</svg>\n");
    log::debug!("rendered {} figures to {} bytes of SVG", drawing.figure_count(), svg.len());
    svg
}
