//! Background load and save.
//!
//! Jobs run on a plain thread and report back over a channel. The editor
//! polls [`PendingJob::try_complete`] from its own loop, or blocks with
//! [`PendingJob::wait`]. A load decodes into a fresh drawing without touching
//! the shared one; a save encodes while holding the drawing's lock and writes
//! the file after releasing it.

use hd_core::{
    DomError, Drawing, DrawingFormat, DrawingKind, QuadTreeConfig, SharedDrawing, dom,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// What a finished job hands back.
pub enum Completion {
    Loaded(Result<Box<dyn Drawing>, DomError>),
    Saved(Result<PathBuf, DomError>),
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Completion::Loaded(Ok(d)) => write!(f, "Loaded({} figures)", d.figure_count()),
            Completion::Loaded(Err(e)) => write!(f, "Loaded(Err({e}))"),
            Completion::Saved(r) => write!(f, "Saved({r:?})"),
        }
    }
}

/// A job in flight.
#[derive(Debug)]
pub struct PendingJob {
    rx: Receiver<Completion>,
    path: PathBuf,
    saving: bool,
}

impl PendingJob {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_save(&self) -> bool {
        self.saving
    }

    /// The job's result, if it has finished. A worker that died without
    /// reporting yields an I/O error.
    pub fn try_complete(&self) -> Option<Completion> {
        match self.rx.try_recv() {
            Ok(c) => Some(c),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.lost()),
        }
    }

    /// Block until the job finishes.
    pub fn wait(self) -> Completion {
        self.rx.recv().unwrap_or_else(|_| self.lost())
    }

    fn lost(&self) -> Completion {
        log::error!("worker for {} exited without reporting", self.path.display());
        let e = DomError::Io(std::io::Error::other("worker thread exited"));
        if self.saving {
            Completion::Saved(Err(e))
        } else {
            Completion::Loaded(Err(e))
        }
    }
}

/// Read and decode `path` into a new drawing of `kind`.
pub fn spawn_load(
    path: impl Into<PathBuf>,
    format: DrawingFormat,
    kind: DrawingKind,
    quadtree: QuadTreeConfig,
) -> PendingJob {
    let path = path.into();
    let (tx, rx) = mpsc::channel();
    let job_path = path.clone();
    thread::spawn(move || {
        log::debug!("loading {}", job_path.display());
        let result = std::fs::read(&job_path)
            .map_err(DomError::from)
            .and_then(|bytes| dom::load_into(&bytes, format, kind.create_with(quadtree)));
        if let Err(e) = &result {
            log::warn!("loading {} failed: {e}", job_path.display());
        }
        // The editor may have dropped the job; nothing to report to then.
        let _ = tx.send(Completion::Loaded(result));
    });
    PendingJob {
        rx,
        path,
        saving: false,
    }
}

/// Encode the shared drawing and write it to `path`.
pub fn spawn_save(
    shared: SharedDrawing,
    path: impl Into<PathBuf>,
    format: DrawingFormat,
) -> PendingJob {
    let path = path.into();
    let (tx, rx) = mpsc::channel();
    let job_path = path.clone();
    thread::spawn(move || {
        log::debug!("saving {}", job_path.display());
        let encoded = {
            let drawing = shared.lock();
            dom::save(&**drawing, format)
        };
        let result = encoded
            .and_then(|bytes| std::fs::write(&job_path, bytes).map_err(DomError::from))
            .map(|()| job_path.clone());
        if let Err(e) = &result {
            log::warn!("saving {} failed: {e}", job_path.display());
        }
        let _ = tx.send(Completion::Saved(result));
    });
    PendingJob {
        rx,
        path,
        saving: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_core::{Figure, Rect, drawing};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hd-worker-{}-{name}", std::process::id()))
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("round-trip.json");
        let mut d = DrawingKind::Default.create();
        d.add(Figure::rectangle(Rect::new(1.0, 2.0, 3.0, 4.0)));
        let shared = drawing::shared(d);

        match spawn_save(shared, &path, DrawingFormat::Json).wait() {
            Completion::Saved(Ok(p)) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
        let job = spawn_load(
            &path,
            DrawingFormat::Json,
            DrawingKind::QuadTree,
            QuadTreeConfig::default(),
        );
        match job.wait() {
            Completion::Loaded(Ok(d)) => assert_eq!(d.figure_count(), 1),
            other => panic!("unexpected {other:?}"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let job = spawn_load(
            temp_path("does-not-exist.json"),
            DrawingFormat::Json,
            DrawingKind::Default,
            QuadTreeConfig::default(),
        );
        assert!(matches!(job.wait(), Completion::Loaded(Err(DomError::Io(_)))));
    }
}
