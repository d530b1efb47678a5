//! Structured persistence.
//!
//! Figures and drawings read and write themselves through the [`DomInput`] /
//! [`DomOutput`] element-tree contract: open an element, read or write its
//! attributes and children, close it. [`DomElement`] is the in-memory tree
//! behind both, and [`DrawingFormat`] turns it into bytes.
//!
//! Layout of a saved drawing:
//!
//! ```text
//! drawing
//! ├── rect        ref=f0 x y w h  [attribute keys…]
//! ├── connection  ref=f1 points start startConnector end endConnector
//! └── group       ref=f2
//!     └── …
//! ```

use crate::attribute::{AttributeKey, AttributeValue};
use crate::connector::{ConnectionData, Connector, ConnectorKind};
use crate::drawing::{Drawing, DrawingKind};
use crate::error::DomError;
use crate::figure::{Figure, FigureKind};
use crate::id::FigureId;
use crate::locator::RelativeLocator;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

// ─── Contract ────────────────────────────────────────────────────────────

pub trait DomOutput {
    fn open_element(&mut self, name: &str);
    fn add_attribute(&mut self, name: &str, value: &str);
    fn close_element(&mut self);
}

pub trait DomInput {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Number of children of the current element.
    fn element_count(&self) -> usize;
    /// Descend into the `index`-th child.
    fn open_element_at(&mut self, index: usize) -> Result<(), DomError>;
    /// Descend into the first child named `name`.
    fn open_element(&mut self, name: &str) -> Result<(), DomError>;
    fn close_element(&mut self);
}

// ─── Element Tree ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomElement>,
}

impl DomElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Builds a [`DomElement`] tree.
#[derive(Debug, Default)]
pub struct DomWriter {
    stack: Vec<DomElement>,
    root: Option<DomElement>,
}

impl DomWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree; `None` if no element was closed at the top level.
    pub fn finish(self) -> Option<DomElement> {
        self.root
    }
}

impl DomOutput for DomWriter {
    fn open_element(&mut self, name: &str) {
        self.stack.push(DomElement::new(name));
    }

    fn add_attribute(&mut self, name: &str, value: &str) {
        if let Some(top) = self.stack.last_mut() {
            top.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn close_element(&mut self) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.root = Some(done),
        }
    }
}

/// Walks a [`DomElement`] tree.
#[derive(Debug)]
pub struct DomReader<'a> {
    root: &'a DomElement,
    path: Vec<&'a DomElement>,
}

impl<'a> DomReader<'a> {
    pub fn new(root: &'a DomElement) -> Self {
        Self {
            root,
            path: Vec::new(),
        }
    }

    fn current(&self) -> &'a DomElement {
        self.path.last().copied().unwrap_or(self.root)
    }
}

impl DomInput for DomReader<'_> {
    fn tag_name(&self) -> &str {
        &self.current().name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.current().attributes.get(name).map(String::as_str)
    }

    fn element_count(&self) -> usize {
        self.current().children.len()
    }

    fn open_element_at(&mut self, index: usize) -> Result<(), DomError> {
        let current = self.current();
        let child = current
            .children
            .get(index)
            .ok_or_else(|| DomError::MissingChild {
                element: current.name.clone(),
                index,
            })?;
        self.path.push(child);
        Ok(())
    }

    fn open_element(&mut self, name: &str) -> Result<(), DomError> {
        let current = self.current();
        let child = current
            .children
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DomError::UnexpectedElement {
                expected: name.to_string(),
                found: current.name.clone(),
            })?;
        self.path.push(child);
        Ok(())
    }

    fn close_element(&mut self) {
        self.path.pop();
    }
}

// ─── Byte Formats ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingFormat {
    #[default]
    Json,
    MessagePack,
}

impl DrawingFormat {
    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" | "hdj" => Some(DrawingFormat::Json),
            "msgpack" | "mpk" | "hdm" => Some(DrawingFormat::MessagePack),
            _ => None,
        }
    }

    pub fn encode(self, root: &DomElement) -> Result<Vec<u8>, DomError> {
        Ok(match self {
            DrawingFormat::Json => serde_json::to_vec_pretty(root)?,
            DrawingFormat::MessagePack => rmp_serde::to_vec_named(root)?,
        })
    }

    pub fn decode(self, bytes: &[u8]) -> Result<DomElement, DomError> {
        Ok(match self {
            DrawingFormat::Json => serde_json::from_slice(bytes)?,
            DrawingFormat::MessagePack => rmp_serde::from_slice(bytes)?,
        })
    }
}

/// Serialize a drawing to bytes.
pub fn save(drawing: &dyn Drawing, format: DrawingFormat) -> Result<Vec<u8>, DomError> {
    let mut out = DomWriter::new();
    write_drawing(drawing, &mut out);
    let root = out.finish().unwrap_or_else(|| DomElement::new(DRAWING));
    format.encode(&root)
}

/// Deserialize bytes into a fresh drawing of the given kind.
pub fn load(
    bytes: &[u8],
    format: DrawingFormat,
    kind: DrawingKind,
) -> Result<Box<dyn Drawing>, DomError> {
    load_into(bytes, format, kind.create())
}

/// Deserialize bytes into `drawing`, which should be empty.
pub fn load_into(
    bytes: &[u8],
    format: DrawingFormat,
    mut drawing: Box<dyn Drawing>,
) -> Result<Box<dyn Drawing>, DomError> {
    let root = format.decode(bytes)?;
    read_drawing(&mut DomReader::new(&root), drawing.as_mut())?;
    Ok(drawing)
}

// ─── Drawing I/O ─────────────────────────────────────────────────────────

const DRAWING: &str = "drawing";

/// Give `figure` and every group member below it a file reference.
fn assign_refs(figure: &Figure, refs: &mut HashMap<FigureId, String>) {
    let r = format!("f{}", refs.len());
    refs.insert(figure.id(), r);
    for child in figure.children() {
        assign_refs(child, refs);
    }
}

/// Write every top-level figure in list order.
pub fn write_drawing(drawing: &dyn Drawing, out: &mut dyn DomOutput) {
    let mut refs: HashMap<FigureId, String> = HashMap::new();
    for figure in drawing.children().iter().filter_map(|id| drawing.figure(*id)) {
        assign_refs(figure, &mut refs);
    }
    out.open_element(DRAWING);
    for id in drawing.children() {
        if let Some(figure) = drawing.figure(*id) {
            write_figure(figure, out, &refs);
        }
    }
    out.close_element();
}

/// Read figures into `drawing` without recording edits. Connections are
/// attached once every figure is known.
pub fn read_drawing(input: &mut dyn DomInput, drawing: &mut dyn Drawing) -> Result<(), DomError> {
    if input.tag_name() != DRAWING {
        return Err(DomError::UnexpectedElement {
            expected: DRAWING.to_string(),
            found: input.tag_name().to_string(),
        });
    }
    let mut refs: HashMap<String, FigureId> = HashMap::new();
    let mut pending: Vec<(Figure, Option<PendingEnd>, Option<PendingEnd>)> = Vec::new();

    for i in 0..input.element_count() {
        input.open_element_at(i)?;
        let (figure, ends) = read_figure(input, &mut refs)?;
        input.close_element();
        pending.push((figure, ends.0, ends.1));
    }

    for (mut figure, start, end) in pending {
        if let Some(conn) = figure.connection_mut() {
            conn.start = start.map(|e| e.resolve(&refs)).transpose()?;
            conn.end = end.map(|e| e.resolve(&refs)).transpose()?;
        }
        drawing.basic_add(figure);
    }
    log::debug!("read drawing with {} figures", drawing.figure_count());
    Ok(())
}

// ─── Figure I/O ──────────────────────────────────────────────────────────

/// A connection end whose owner is still a file reference.
struct PendingEnd {
    owner: String,
    kind: ConnectorKind,
}

impl PendingEnd {
    fn resolve(self, refs: &HashMap<String, FigureId>) -> Result<Connector, DomError> {
        let owner = refs
            .get(&self.owner)
            .copied()
            .ok_or(DomError::DanglingReference(self.owner))?;
        Ok(Connector {
            owner,
            kind: self.kind,
        })
    }
}

fn fmt_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_connector(kind: ConnectorKind) -> String {
    match kind {
        ConnectorKind::Chop => "chop".to_string(),
        ConnectorKind::Locator(l) => format!("{},{}", l.rel_x, l.rel_y),
    }
}

fn malformed(name: &str, value: &str) -> DomError {
    DomError::MalformedAttribute {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_pair(name: &str, raw: &str) -> Result<(f64, f64), DomError> {
    let (x, y) = raw.split_once(',').ok_or_else(|| malformed(name, raw))?;
    let x = x.trim().parse().map_err(|_| malformed(name, raw))?;
    let y = y.trim().parse().map_err(|_| malformed(name, raw))?;
    Ok((x, y))
}

fn parse_points(name: &str, raw: &str) -> Result<SmallVec<[Point; 4]>, DomError> {
    raw.split_whitespace()
        .map(|pair| parse_pair(name, pair).map(Point::from))
        .collect()
}

fn parse_connector(name: &str, raw: &str) -> Result<ConnectorKind, DomError> {
    if raw == "chop" {
        return Ok(ConnectorKind::Chop);
    }
    let (x, y) = parse_pair(name, raw)?;
    Ok(ConnectorKind::Locator(RelativeLocator::new(x, y)))
}

fn required<'a>(input: &'a dyn DomInput, name: &str) -> Result<&'a str, DomError> {
    input.attribute(name).ok_or_else(|| DomError::MissingAttribute {
        element: input.tag_name().to_string(),
        name: name.to_string(),
    })
}

fn number(input: &dyn DomInput, name: &str) -> Result<f64, DomError> {
    let raw = required(input, name)?;
    raw.parse().map_err(|_| malformed(name, raw))
}

pub fn write_figure(figure: &Figure, out: &mut dyn DomOutput, refs: &HashMap<FigureId, String>) {
    out.open_element(figure.kind.tag());
    if let Some(r) = refs.get(&figure.id()) {
        out.add_attribute("ref", r);
    }
    match &figure.kind {
        FigureKind::Rectangle { rect } | FigureKind::Ellipse { rect } => {
            out.add_attribute("x", &rect.x0.to_string());
            out.add_attribute("y", &rect.y0.to_string());
            out.add_attribute("w", &rect.width().to_string());
            out.add_attribute("h", &rect.height().to_string());
        }
        FigureKind::Line { points } => out.add_attribute("points", &fmt_points(points)),
        FigureKind::Text { origin, text } => {
            out.add_attribute("x", &origin.x.to_string());
            out.add_attribute("y", &origin.y.to_string());
            out.add_attribute("text", text);
        }
        FigureKind::Group { .. } => {}
        FigureKind::Connection(c) => {
            out.add_attribute("points", &fmt_points(&c.points));
            for (prefix, end) in [("start", c.start), ("end", c.end)] {
                if let Some(end) = end
                    && let Some(r) = refs.get(&end.owner)
                {
                    out.add_attribute(prefix, r);
                    out.add_attribute(&format!("{prefix}Connector"), &fmt_connector(end.kind));
                }
            }
        }
    }
    for (key, value) in figure.attributes.iter() {
        out.add_attribute(key.name(), &value.encode());
    }
    for child in figure.children() {
        write_figure(child, out, refs);
    }
    out.close_element();
}

type Ends = (Option<PendingEnd>, Option<PendingEnd>);

/// Read the figure at the current element, recording its `ref` and those of
/// any group members. Connection ends come back unresolved.
fn read_figure(
    input: &mut dyn DomInput,
    refs: &mut HashMap<String, FigureId>,
) -> Result<(Figure, Ends), DomError> {
    let tag = input.tag_name().to_string();
    let mut ends: Ends = (None, None);
    let kind = match tag.as_str() {
        "rect" | "ellipse" => {
            let (x, y) = (number(input, "x")?, number(input, "y")?);
            let rect = Rect::new(x, y, x + number(input, "w")?, y + number(input, "h")?);
            if tag == "rect" {
                FigureKind::Rectangle { rect }
            } else {
                FigureKind::Ellipse { rect }
            }
        }
        "line" => FigureKind::Line {
            points: parse_points("points", required(input, "points")?)?,
        },
        "text" => FigureKind::Text {
            origin: Point::new(number(input, "x")?, number(input, "y")?),
            text: input.attribute("text").unwrap_or_default().to_string(),
        },
        "group" => {
            let mut children = Vec::with_capacity(input.element_count());
            for i in 0..input.element_count() {
                input.open_element_at(i)?;
                let (child, _) = read_figure(input, refs)?;
                input.close_element();
                children.push(child);
            }
            FigureKind::Group { children }
        }
        "connection" => {
            let points = parse_points("points", required(input, "points")?)?;
            let end = |prefix: &str| -> Result<Option<PendingEnd>, DomError> {
                let Some(owner) = input.attribute(prefix) else {
                    return Ok(None);
                };
                let name = format!("{prefix}Connector");
                let kind = match input.attribute(&name) {
                    Some(raw) => parse_connector(&name, raw)?,
                    None => ConnectorKind::Chop,
                };
                Ok(Some(PendingEnd {
                    owner: owner.to_string(),
                    kind,
                }))
            };
            ends = (end("start")?, end("end")?);
            FigureKind::Connection(ConnectionData {
                points,
                start: None,
                end: None,
            })
        }
        other => return Err(DomError::UnknownFigure(other.to_string())),
    };

    let mut figure = Figure::new(kind);
    for key in AttributeKey::ALL {
        if let Some(raw) = input.attribute(key.name()) {
            let value = AttributeValue::decode(key, raw).ok_or_else(|| malformed(key.name(), raw))?;
            figure.attributes.set(key, Some(value));
        }
    }
    if let Some(r) = input.attribute("ref") {
        refs.insert(r.to_string(), figure.id());
    }
    Ok((figure, ends))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::DefaultDrawing;
    use crate::figure::Boundable;
    use pretty_assertions::assert_eq;

    #[test]
    fn writer_builds_nested_tree() {
        let mut w = DomWriter::new();
        w.open_element("a");
        w.add_attribute("k", "v");
        w.open_element("b");
        w.close_element();
        w.close_element();
        let root = w.finish().unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.attributes.get("k").map(String::as_str), Some("v"));
        assert_eq!(root.children, vec![DomElement::new("b")]);
    }

    #[test]
    fn reader_reports_missing_children() {
        let root = DomElement::new("drawing");
        let mut r = DomReader::new(&root);
        assert_eq!(r.element_count(), 0);
        assert!(matches!(
            r.open_element_at(0),
            Err(DomError::MissingChild { index: 0, .. })
        ));
        assert!(matches!(
            r.open_element("rect"),
            Err(DomError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn unknown_figure_is_rejected() {
        let mut root = DomElement::new("drawing");
        root.children.push(DomElement::new("spline"));
        let mut d = DefaultDrawing::new();
        let err = read_drawing(&mut DomReader::new(&root), &mut d).unwrap_err();
        assert!(matches!(err, DomError::UnknownFigure(tag) if tag == "spline"));
    }

    #[test]
    fn dangling_connection_reference_is_rejected() {
        let mut conn = DomElement::new("connection");
        conn.attributes.insert("points".into(), "0,0 1,1".into());
        conn.attributes.insert("start".into(), "f9".into());
        let mut root = DomElement::new("drawing");
        root.children.push(conn);
        let mut d = DefaultDrawing::new();
        let err = read_drawing(&mut DomReader::new(&root), &mut d).unwrap_err();
        assert!(matches!(err, DomError::DanglingReference(r) if r == "f9"));
    }

    #[test]
    fn malformed_number_is_reported() {
        let mut rect = DomElement::new("rect");
        for (k, v) in [("x", "0"), ("y", "zero"), ("w", "1"), ("h", "1")] {
            rect.attributes.insert(k.into(), v.into());
        }
        let mut root = DomElement::new("drawing");
        root.children.push(rect);
        let mut d = DefaultDrawing::new();
        let err = read_drawing(&mut DomReader::new(&root), &mut d).unwrap_err();
        assert!(matches!(err, DomError::MalformedAttribute { name, .. } if name == "y"));
    }

    #[test]
    fn json_and_msgpack_preserve_geometry() {
        let mut d = DefaultDrawing::new();
        d.basic_add(
            Figure::ellipse(Rect::new(0.5, 1.25, 10.0, 20.0))
                .with(AttributeKey::FillColor, AttributeValue::Color(None)),
        );
        d.basic_add(Figure::text(Point::new(3.0, 4.0), "hello"));
        for format in [DrawingFormat::Json, DrawingFormat::MessagePack] {
            let bytes = save(&d, format).unwrap();
            let loaded = load(&bytes, format, DrawingKind::QuadTree).unwrap();
            assert_eq!(loaded.figure_count(), 2);
            let first = loaded.figure(loaded.children()[0]).unwrap();
            assert_eq!(first.bounds(), Rect::new(0.5, 1.25, 10.0, 20.0));
            assert_eq!(first.attributes.color(AttributeKey::FillColor), None);
        }
    }

    #[test]
    fn connection_to_a_group_member_survives_save_and_load() {
        let member = Figure::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let member_id = member.id();
        let group = Figure::group(vec![member, Figure::ellipse(Rect::new(0.0, 20.0, 10.0, 30.0))]);
        let other = Figure::rectangle(Rect::new(100.0, 0.0, 110.0, 10.0));
        let other_id = other.id();
        let mut conn = Figure::new_connection(Point::new(5.0, 5.0), Point::new(105.0, 5.0));
        if let Some(c) = conn.connection_mut() {
            c.start = Some(Connector::chop(member_id));
            c.end = Some(Connector {
                owner: other_id,
                kind: ConnectorKind::Locator(RelativeLocator::new(0.0, 0.5)),
            });
        }

        let mut d = DefaultDrawing::new();
        d.basic_add(group);
        d.basic_add(other);
        d.basic_add(conn);

        for format in [DrawingFormat::Json, DrawingFormat::MessagePack] {
            let bytes = save(&d, format).unwrap();
            let loaded = load(&bytes, format, DrawingKind::Default).unwrap();
            let ids = loaded.children().to_vec();
            assert_eq!(ids.len(), 3);
            let loaded_member = loaded.figure(ids[0]).unwrap().children()[0].id();
            let data = loaded.figure(ids[2]).and_then(Figure::connection).unwrap();
            assert_eq!(data.start, Some(Connector::chop(loaded_member)));
            assert_eq!(
                data.end,
                Some(Connector {
                    owner: ids[1],
                    kind: ConnectorKind::Locator(RelativeLocator::new(0.0, 0.5)),
                })
            );
        }
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(DrawingFormat::from_extension("JSON"), Some(DrawingFormat::Json));
        assert_eq!(DrawingFormat::from_extension("hdm"), Some(DrawingFormat::MessagePack));
        assert_eq!(DrawingFormat::from_extension("xml"), None);
    }
}
