//! Error types for the edit log and for persistence.

use crate::id::FigureId;
use thiserror::Error;

/// Protocol violations in the undo/redo edit log.
///
/// These indicate a caller bug rather than an environmental failure: the
/// operation is rejected and the model is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("cannot undo {0}")]
    CannotUndo(String),
    #[error("cannot redo {0}")]
    CannotRedo(String),
    #[error("a composite edit is still open")]
    CompositeOpen,
    #[error("composite edit closed out of order")]
    UnbalancedComposite,
    #[error("figure {0} is not in the drawing")]
    MissingFigure(FigureId),
}

/// Failures while reading or writing a drawing.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("expected element <{expected}>, found <{found}>")]
    UnexpectedElement { expected: String, found: String },
    #[error("element <{element}> has no child at index {index}")]
    MissingChild { element: String, index: usize },
    #[error("element <{element}> is missing attribute `{name}`")]
    MissingAttribute { element: String, name: String },
    #[error("attribute `{name}` has malformed value `{value}`")]
    MalformedAttribute { name: String, value: String },
    #[error("unknown figure element <{0}>")]
    UnknownFigure(String),
    #[error("connection refers to unknown figure ref {0}")]
    DanglingReference(String),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
