use hd_core::{DomError, EditError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("{} is still being processed", .0.display())]
    Busy(PathBuf),
}
