//! Rendering sinks for HotDraw drawings.

pub mod svg;

pub use svg::{SvgCanvas, render_svg};
