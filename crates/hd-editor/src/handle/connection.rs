//! Handles that create and reconnect connections.
//!
//! While the pointer moves, the figure under it that would accept the
//! connection shows its connectors. Nothing is recorded until release.

use super::{Handle, HandleContext, HandleKind, Snapshot, discard_provisional, show_connectors};
use crate::input::Modifiers;
use hd_core::{
    Color, Connectable, Connector, ConnectorKind, Drawing, Figure, FigureId, Graphics,
};
use kurbo::{Circle, Point, Shape};
use smallvec::SmallVec;
use std::collections::HashSet;

const CONNECTOR_HANDLE_COLOR: Color = Color::rgba(0.0, 0.6, 0.0, 1.0);

/// The connectable figure and connector under `p`, ignoring `ignore`.
pub(crate) fn find_target(
    drawing: &mut dyn Drawing,
    p: Point,
    ignore: &HashSet<FigureId>,
) -> Option<(FigureId, Connector)> {
    let id = drawing.find_figure_except(p, ignore)?;
    let figure = drawing.figure(id)?;
    if !figure.can_connect() {
        return None;
    }
    figure.find_connector(p).map(|c| (id, c))
}

/// Keeps the connector affordance on at most one figure.
#[derive(Debug, Default)]
struct Highlight(Option<FigureId>);

impl Highlight {
    fn set(&mut self, drawing: &mut dyn Drawing, target: Option<FigureId>) {
        if self.0 == target {
            return;
        }
        if let Some(old) = self.0 {
            show_connectors(drawing, old, false);
        }
        if let Some(new) = target {
            show_connectors(drawing, new, true);
        }
        self.0 = target;
    }

    fn clear(&mut self, drawing: &mut dyn Drawing) {
        self.set(drawing, None);
    }
}

// ─── Connection Creation ─────────────────────────────────────────────────

/// A provisional connection dragged out of a start connector.
///
/// The provisional figure lives in the drawing without an edit. On release
/// it is either added for real inside one composite or dropped.
#[derive(Debug)]
pub(crate) struct ConnectionTracker {
    connection: FigureId,
    source: FigureId,
    target: Option<(FigureId, Connector)>,
    highlight: Highlight,
}

impl ConnectionTracker {
    pub(crate) fn start(drawing: &mut dyn Drawing, start: Connector, anchor: Point) -> Option<Self> {
        let origin = drawing.figure(start.owner).map(|f| start.center(f))?;
        let mut figure = Figure::new_connection(origin, anchor);
        if let Some(data) = figure.connection_mut() {
            data.start = Some(start);
        }
        let connection = drawing.basic_add(figure);
        // Lays the start out and repaints.
        drawing.update_figure(connection, &mut |_| {});
        log::trace!("tracking connection {connection} from {}", start.owner);
        Some(Self {
            connection,
            source: start.owner,
            target: None,
            highlight: Highlight::default(),
        })
    }

    pub(crate) fn step(&mut self, drawing: &mut dyn Drawing, lead: Point) {
        let ignore = HashSet::from([self.connection, self.source]);
        self.target = find_target(drawing, lead, &ignore);
        self.highlight.set(drawing, self.target.map(|(id, _)| id));
        drawing.update_figure(self.connection, &mut |f| {
            if let Some(data) = f.connection_mut()
                && let Some(end) = data.points.last_mut()
            {
                *end = lead;
            }
        });
    }

    /// Commit the connection if the pointer was released over a target.
    pub(crate) fn finish(mut self, ctx: &mut HandleContext<'_>, lead: Point) -> Option<FigureId> {
        self.step(ctx.drawing, lead);
        self.highlight.clear(ctx.drawing);
        let mut figure = discard_provisional(ctx.drawing, self.connection)?;
        let (_, end) = self.target?;
        if let Some(data) = figure.connection_mut() {
            data.end = Some(end);
        }
        let id = ctx
            .undo
            .scoped(ctx.drawing, "Create Connection", |d| d.add(figure));
        log::debug!("connected {} to {} with {id}", self.source, end.owner);
        Some(id)
    }

    pub(crate) fn cancel(mut self, drawing: &mut dyn Drawing) {
        self.highlight.clear(drawing);
        discard_provisional(drawing, self.connection);
    }
}

/// Drag from one of a figure's connectors to create a connection.
pub struct ConnectorHandle {
    connector: Connector,
    tracker: Option<ConnectionTracker>,
}

impl ConnectorHandle {
    pub fn new(connector: Connector) -> Self {
        Self {
            connector,
            tracker: None,
        }
    }

    /// One handle per located connector of `figure`.
    pub fn all(figure: &Figure) -> SmallVec<[Self; 4]> {
        figure
            .connectors()
            .into_iter()
            .filter(|c| matches!(c.kind, ConnectorKind::Locator(_)))
            .map(Self::new)
            .collect()
    }
}

impl Handle for ConnectorHandle {
    fn owner(&self) -> FigureId {
        self.connector.owner
    }

    fn kind(&self) -> HandleKind {
        HandleKind::Connector
    }

    fn locate(&self, drawing: &dyn Drawing) -> Option<Point> {
        drawing
            .figure(self.connector.owner)
            .map(|f| self.connector.center(f))
    }

    fn label(&self) -> &'static str {
        "Create Connection"
    }

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, _m: Modifiers) {
        self.tracker = ConnectionTracker::start(ctx.drawing, self.connector, anchor);
    }

    fn track_step(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, lead: Point, _m: Modifiers) {
        if let Some(t) = &mut self.tracker {
            t.step(ctx.drawing, lead);
        }
    }

    fn track_end(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, lead: Point, _m: Modifiers) {
        if let Some(t) = self.tracker.take() {
            t.finish(ctx, lead);
        }
    }

    fn cancel(&mut self, ctx: &mut HandleContext<'_>) {
        if let Some(t) = self.tracker.take() {
            t.cancel(ctx.drawing);
        }
    }

    fn draw(&self, drawing: &dyn Drawing, g: &mut dyn Graphics, size: f64) {
        if let Some(c) = self.locate(drawing) {
            let path = Circle::new(c, size / 2.0).to_path(0.1);
            g.fill_path(&path, CONNECTOR_HANDLE_COLOR);
        }
    }
}

// ─── Reconnection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    Start,
    End,
}

/// Drag one end of an existing connection onto another connector.
///
/// Releasing away from any connectable figure keeps the old attachment.
pub struct ConnectionEndHandle {
    connection: FigureId,
    end: ConnectionEnd,
    snapshot: Option<Snapshot>,
    target: Option<Connector>,
    highlight: Highlight,
}

impl ConnectionEndHandle {
    pub fn new(connection: FigureId, end: ConnectionEnd) -> Self {
        Self {
            connection,
            end,
            snapshot: None,
            target: None,
            highlight: Highlight::default(),
        }
    }

    pub fn both(connection: FigureId) -> [Self; 2] {
        [
            Self::new(connection, ConnectionEnd::Start),
            Self::new(connection, ConnectionEnd::End),
        ]
    }

    fn attach(&self, f: &mut Figure, lead: Point, connector: Option<Connector>) {
        let Some(data) = f.connection_mut() else {
            return;
        };
        let (point, slot) = match self.end {
            ConnectionEnd::Start => (data.points.first_mut(), &mut data.start),
            ConnectionEnd::End => (data.points.last_mut(), &mut data.end),
        };
        if let Some(p) = point {
            *p = lead;
        }
        *slot = connector;
    }
}

impl Handle for ConnectionEndHandle {
    fn owner(&self) -> FigureId {
        self.connection
    }

    fn kind(&self) -> HandleKind {
        HandleKind::ConnectionEnd(self.end)
    }

    fn locate(&self, drawing: &dyn Drawing) -> Option<Point> {
        let data = drawing.figure(self.connection)?.connection()?;
        Some(match self.end {
            ConnectionEnd::Start => data.start_point(),
            ConnectionEnd::End => data.end_point(),
        })
    }

    fn label(&self) -> &'static str {
        "Reconnect"
    }

    fn track_start(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, _m: Modifiers) {
        self.snapshot = Snapshot::take(ctx.drawing, self.connection);
        self.target = None;
    }

    fn track_step(&mut self, ctx: &mut HandleContext<'_>, _anchor: Point, lead: Point, _m: Modifiers) {
        let Some(snap) = &self.snapshot else {
            return;
        };
        let ignore = HashSet::from([self.connection]);
        let found = find_target(ctx.drawing, lead, &ignore);
        self.target = found.map(|(_, c)| c);
        self.highlight.set(ctx.drawing, found.map(|(id, _)| id));
        snap.apply(ctx.drawing, |f| self.attach(f, lead, None));
    }

    fn track_end(&mut self, ctx: &mut HandleContext<'_>, anchor: Point, lead: Point, m: Modifiers) {
        self.track_step(ctx, anchor, lead, m);
        self.highlight.clear(ctx.drawing);
        let Some(snap) = self.snapshot.take() else {
            return;
        };
        match self.target.take() {
            Some(connector) => {
                snap.apply(ctx.drawing, |f| self.attach(f, lead, Some(connector)));
                snap.commit(ctx.drawing, self.label());
            }
            None => snap.restore(ctx.drawing),
        }
    }

    fn cancel(&mut self, ctx: &mut HandleContext<'_>) {
        self.highlight.clear(ctx.drawing);
        self.target = None;
        if let Some(snap) = self.snapshot.take() {
            snap.restore(ctx.drawing);
        }
    }
}
