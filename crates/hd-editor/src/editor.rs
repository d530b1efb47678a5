//! The drawing editor: owns the drawing, its view, the edit history and the
//! active tool, and routes input between them.

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::input::InputEvent;
use crate::shortcuts::ShortcutMap;
use crate::tools::{SelectionTool, Tool, ToolContext, ToolKind, ToolOutcome, ToolState};
use crate::view::DrawingView;
use crate::worker::{self, Completion, PendingJob};
use hd_core::{DrawingFormat, Graphics, Rect, SharedDrawing, UndoRedoManager, drawing};
use std::path::PathBuf;
use std::sync::Arc;

pub struct DrawingEditor {
    drawing: SharedDrawing,
    view: DrawingView,
    undo: UndoRedoManager,
    tool: Box<dyn Tool>,
    /// The tool Tab switches back to.
    previous_tool: ToolKind,
    config: EditorConfig,
    job: Option<PendingJob>,
}

impl Default for DrawingEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl DrawingEditor {
    pub fn new(config: EditorConfig) -> Self {
        let mut initial = config.drawing.create_with(config.quadtree);
        let mut view = DrawingView::new(&config);
        view.attach(initial.as_mut());
        let mut editor = Self {
            drawing: drawing::shared(initial),
            view,
            undo: UndoRedoManager::new(config.undo_limit),
            tool: Box::new(SelectionTool::new()),
            previous_tool: ToolKind::Select,
            config,
            job: None,
        };
        editor.with_context(|tool, ctx| tool.activate(ctx));
        editor
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The shared drawing. Hold the lock only briefly; the editor takes it
    /// for every event.
    pub fn drawing(&self) -> &SharedDrawing {
        &self.drawing
    }

    pub fn view(&self) -> &DrawingView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut DrawingView {
        &mut self.view
    }

    pub fn undo(&self) -> &UndoRedoManager {
        &self.undo
    }

    pub fn tool(&self) -> &dyn Tool {
        self.tool.as_ref()
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub(crate) fn previous_tool(&self) -> ToolKind {
        self.previous_tool.clone()
    }

    /// Unsaved changes since the last load or save.
    pub fn is_modified(&self) -> bool {
        self.undo.has_significant_edits()
    }

    /// Lock the drawing and run `f` against the active tool, then collect
    /// whatever edits `f` left queued.
    pub(crate) fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut dyn Tool, &mut ToolContext<'_>) -> R,
    ) -> R {
        let shared = Arc::clone(&self.drawing);
        let mut drawing = shared.lock();
        let mut ctx = ToolContext {
            drawing: &mut **drawing,
            view: &mut self.view,
            undo: &mut self.undo,
        };
        let out = f(self.tool.as_mut(), &mut ctx);
        ctx.undo.absorb(ctx.drawing);
        out
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one event. Keys go through the shortcut map, pointer events to
    /// the active tool. A disabled view ignores everything.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<ToolOutcome, EditorError> {
        if !self.view.is_enabled() {
            log::trace!("view disabled, dropping {event:?}");
            return Ok(ToolOutcome::Ignored);
        }
        if let InputEvent::Key { key, modifiers } = event {
            let Some(action) = ShortcutMap::resolve(key, *modifiers) else {
                return Ok(ToolOutcome::Ignored);
            };
            return Ok(if self.perform(action)? {
                ToolOutcome::Handled
            } else {
                ToolOutcome::Ignored
            });
        }
        let outcome = self.with_context(|tool, ctx| tool.handle(event, ctx));
        if outcome == ToolOutcome::Done {
            self.set_tool(ToolKind::Select);
        }
        Ok(outcome)
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.tool.kind() == kind {
            return;
        }
        self.with_context(|tool, ctx| tool.deactivate(ctx));
        self.previous_tool = self.tool.kind();
        self.tool = kind.create();
        self.with_context(|tool, ctx| tool.activate(ctx));
        log::debug!("tool: {:?}", self.tool.kind());
    }

    /// Abandon the gesture in progress, if any.
    pub fn cancel_gesture(&mut self) {
        self.with_context(|tool, ctx| {
            if tool.state() == ToolState::Tracking {
                tool.cancel(ctx);
            }
        });
    }

    // ─── Painting ────────────────────────────────────────────────────────

    pub fn paint(&self, g: &mut dyn Graphics, clip: Rect) {
        let mut drawing = self.drawing.lock();
        self.view.paint(&mut **drawing, g, clip);
    }

    // ─── Load & Save ─────────────────────────────────────────────────────

    /// Start loading `path` in the background. The view stays disabled until
    /// the job is collected with [`DrawingEditor::poll_worker`] or
    /// [`DrawingEditor::wait_for_worker`].
    pub fn load(
        &mut self,
        path: impl Into<PathBuf>,
        format: DrawingFormat,
    ) -> Result<(), EditorError> {
        self.ensure_idle()?;
        self.cancel_gesture();
        self.view.set_enabled(false);
        self.job = Some(worker::spawn_load(
            path,
            format,
            self.config.drawing,
            self.config.quadtree,
        ));
        Ok(())
    }

    /// Start saving to `path` in the background.
    pub fn save(
        &mut self,
        path: impl Into<PathBuf>,
        format: DrawingFormat,
    ) -> Result<(), EditorError> {
        self.ensure_idle()?;
        self.cancel_gesture();
        self.view.set_enabled(false);
        self.job = Some(worker::spawn_save(Arc::clone(&self.drawing), path, format));
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    fn ensure_idle(&self) -> Result<(), EditorError> {
        match &self.job {
            Some(job) => Err(EditorError::Busy(job.path().to_path_buf())),
            None => Ok(()),
        }
    }

    /// Collect a finished job without blocking. `None` while nothing has
    /// finished.
    pub fn poll_worker(&mut self) -> Option<Result<(), EditorError>> {
        let completion = self.job.as_ref()?.try_complete()?;
        self.job = None;
        Some(self.complete(completion))
    }

    /// Block until the running job finishes. `None` if nothing is running.
    pub fn wait_for_worker(&mut self) -> Option<Result<(), EditorError>> {
        let job = self.job.take()?;
        Some(self.complete(job.wait()))
    }

    fn complete(&mut self, completion: Completion) -> Result<(), EditorError> {
        self.view.set_enabled(true);
        match completion {
            Completion::Loaded(Ok(mut loaded)) => {
                loaded.take_edits();
                let shared = Arc::clone(&self.drawing);
                let mut drawing = shared.lock();
                self.view.detach(&mut **drawing);
                *drawing = loaded;
                self.view.attach(&mut **drawing);
                self.view.clear_selection();
                self.undo.discard_all_edits();
                log::info!("loaded {} figures", drawing.figure_count());
                Ok(())
            }
            Completion::Saved(Ok(path)) => {
                self.undo.mark_saved();
                log::info!("saved {}", path.display());
                Ok(())
            }
            Completion::Loaded(Err(e)) | Completion::Saved(Err(e)) => Err(e.into()),
        }
    }
}
