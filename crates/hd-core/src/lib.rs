pub mod attribute;
pub mod config;
pub mod connector;
pub mod dom;
pub mod drawing;
pub mod error;
pub mod event;
pub mod figure;
pub mod geom;
pub mod graphics;
pub mod id;
pub mod locator;
pub mod quadtree;
pub mod undo;

pub use attribute::{AttributeKey, AttributeValue, Attributes, Color};
pub use config::QuadTreeConfig;
pub use connector::{ConnectionData, Connector, ConnectorKind};
pub use dom::{DomElement, DomInput, DomOutput, DomReader, DomWriter, DrawingFormat};
pub use drawing::{
    DefaultDrawing, Drawing, DrawingKind, FigureIndex, IndexedDrawing, LinearScan,
    QuadTreeDrawing, SharedDrawing,
};
pub use error::{DomError, EditError};
pub use event::{DrawingEvent, Listeners, Subscription};
pub use figure::{
    Boundable, Connectable, Figure, FigureGeometry, FigureKind, Paintable, TextHolding,
};
pub use graphics::{DrawCommand, Graphics, RecordingGraphics};
pub use id::{FigureId, ListenerId};
pub use locator::RelativeLocator;
pub use quadtree::QuadTree;
pub use undo::{CompositeEdit, CompositeGuard, CompositeToken, EditKind, EditState, UndoRedoManager, UndoableEdit};

// Re-export kurbo geometry so downstream crates agree on one version.
pub use kurbo::{Affine, Point, Rect, Vec2};
