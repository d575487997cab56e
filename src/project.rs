use image::RgbaImage;
use std::path::Path;
use uuid::Uuid;

use crate::canvas::{RasterBuffer, RasterError};
use crate::components::history::UndoStack;
use crate::components::selection::{
    FrameHandle, FrameScheduler, ManualFrameClock, SelectionRegion, SelectionSignal,
    SelectionTracker,
};
use crate::config::EditorConfig;
use crate::input::{CanvasMetrics, ClientRect, InputEvent, PointerPhase};
use crate::io::{self, ExportError, LoadError};
use crate::ops::effects::selection_outline;
use crate::ops::processing::{ProcessOutcome, ProcessingEngine, ProcessingMode};
use crate::{log_err, log_info};

/// Notifications for whoever renders the session or gates UI actions.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    ImageLoaded { width: u32, height: u32 },
    SelectionUpdated(SelectionRegion),
    SelectionCommitted(SelectionRegion),
    SelectionDiscarded,
    /// Live pixels changed; re-render.
    BufferChanged,
    HistoryChanged { can_undo: bool },
    /// A processed result is available for export.
    ExportReady,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored,
    NothingToUndo,
    NoImage,
}

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Single editing session: one loaded image, its undo history and the
/// in-progress selection.
pub struct EditingSession<S: FrameScheduler = ManualFrameClock> {
    pub id: Uuid,
    /// Source file name, used to derive export names.
    pub name: String,
    config: EditorConfig,
    engine: ProcessingEngine,
    buffer: Option<RasterBuffer>,
    history: UndoStack,
    tracker: SelectionTracker<S>,
    metrics: Option<CanvasMetrics>,
    mode: ProcessingMode,
    listeners: Vec<Listener>,
}

impl EditingSession<ManualFrameClock> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_scheduler(config, ManualFrameClock::new())
    }

    /// Fire one frame of the manual clock.  Returns how many scheduled
    /// selection updates were applied.
    pub fn advance_frame(&mut self) -> usize {
        let due = self.tracker.scheduler_mut().advance();
        due.into_iter().filter(|h| self.run_frame(*h)).count()
    }
}

impl<S: FrameScheduler> EditingSession<S> {
    pub fn with_scheduler(config: EditorConfig, scheduler: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            engine: ProcessingEngine::new(&config),
            history: UndoStack::new(config.undo_capacity),
            tracker: SelectionTracker::new(scheduler, config.selection_threshold),
            buffer: None,
            metrics: None,
            mode: ProcessingMode::default(),
            listeners: Vec::new(),
            config,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: EditorEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn buffer(&self) -> Option<&RasterBuffer> {
        self.buffer.as_ref()
    }

    /// Current edited pixels, for rendering and export.
    pub fn live_image(&self) -> Option<&RgbaImage> {
        self.buffer.as_ref().map(|b| b.live())
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn selection(&self) -> &SelectionRegion {
        self.tracker.region()
    }

    pub fn tracker(&self) -> &SelectionTracker<S> {
        &self.tracker
    }

    pub fn metrics(&self) -> Option<&CanvasMetrics> {
        self.metrics.as_ref()
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ProcessingMode) {
        self.mode = mode;
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the session image with an already-decoded one.  Undo history
    /// and any selection from the previous image are dropped.
    pub fn load_image(&mut self, name: impl Into<String>, image: RgbaImage) -> Result<(), LoadError> {
        let image = io::prepare_image(image, self.config.max_dimension)?;
        let buffer = RasterBuffer::load(image)?;
        let (width, height) = buffer.dimensions();

        self.name = name.into();
        self.buffer = Some(buffer);
        self.history.clear();
        self.tracker.reset();
        self.metrics = None;
        log_info!("Session {} loaded '{}' ({}x{})", self.id, self.name, width, height);

        self.emit(EditorEvent::ImageLoaded { width, height });
        self.emit(EditorEvent::HistoryChanged { can_undo: false });
        Ok(())
    }

    /// Decode a file and load it.
    pub fn open(&mut self, path: &Path) -> Result<(), LoadError> {
        let image = io::load_image(path, self.config.max_dimension)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.load_image(name, image)
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Route one pointer event.  `rect` is the element's current on-screen
    /// rectangle; it is only measured when a drag starts.
    pub fn handle_pointer(
        &mut self,
        event: &InputEvent,
        rect: ClientRect,
    ) -> Result<Option<ProcessOutcome>, RasterError> {
        match event.phase {
            PointerPhase::Start => {
                self.pointer_down(event, rect);
                Ok(None)
            }
            PointerPhase::Move => {
                self.pointer_move(event);
                Ok(None)
            }
            PointerPhase::End => self.pointer_up(Some(event)),
        }
    }

    /// Start a drag.  Returns `false` when no image is loaded or the element
    /// has no on-screen area.
    pub fn pointer_down(&mut self, event: &InputEvent, rect: ClientRect) -> bool {
        let Some(buffer) = &self.buffer else {
            return false;
        };
        let Some(metrics) = CanvasMetrics::measure(rect, buffer.width(), buffer.height()) else {
            return false;
        };
        self.metrics = Some(metrics);
        self.tracker.start(metrics.to_buffer_coords(event));
        true
    }

    /// Queue a throttled endpoint update.
    pub fn pointer_move(&mut self, event: &InputEvent) -> bool {
        match self.metrics {
            Some(metrics) => self.tracker.move_to(metrics.to_buffer_coords(event)),
            None => false,
        }
    }

    /// Frame callback from the host's scheduler.
    pub fn run_frame(&mut self, handle: FrameHandle) -> bool {
        match self.tracker.run_frame(handle) {
            Some(SelectionSignal::Updated(region)) => {
                self.emit(EditorEvent::SelectionUpdated(region));
                true
            }
            _ => false,
        }
    }

    /// Finish a drag and, when it commits, apply the current mode to it.
    /// `event` is `None` when the release carried no position.
    pub fn pointer_up(&mut self, event: Option<&InputEvent>) -> Result<Option<ProcessOutcome>, RasterError> {
        let pos = match (event, self.metrics) {
            (Some(ev), Some(metrics)) => Some(metrics.to_buffer_coords(ev)),
            _ => None,
        };
        match self.tracker.end(pos) {
            SelectionSignal::Committed(region) => {
                self.emit(EditorEvent::SelectionCommitted(region));
                self.apply(self.mode, &region).map(Some)
            }
            SelectionSignal::Discarded => {
                log_info!("Selection discarded (below {}px)", self.tracker.threshold());
                self.emit(EditorEvent::SelectionDiscarded);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Abandon any in-progress selection.
    pub fn cancel_selection(&mut self) {
        self.tracker.reset();
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Apply `mode` to `region` (checkpointing first).
    pub fn apply(&mut self, mode: ProcessingMode, region: &SelectionRegion) -> Result<ProcessOutcome, RasterError> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(ProcessOutcome::NoImage);
        };
        let outcome = self.engine.apply(mode, region, buffer, &mut self.history)?;

        match outcome {
            ProcessOutcome::Applied { .. } => {
                self.emit(EditorEvent::HistoryChanged { can_undo: self.history.can_undo() });
                self.emit(EditorEvent::BufferChanged);
                self.emit(EditorEvent::ExportReady);
            }
            ProcessOutcome::Checkpointed => {
                self.emit(EditorEvent::HistoryChanged { can_undo: self.history.can_undo() });
            }
            ProcessOutcome::Skipped | ProcessOutcome::NoImage => {}
        }
        Ok(outcome)
    }

    /// Restore the most recent checkpoint.
    pub fn undo(&mut self) -> Result<UndoOutcome, RasterError> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(UndoOutcome::NoImage);
        };
        let Some(entry) = self.history.pop() else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        if let Err(e) = buffer.restore(&entry) {
            log_err!("Undo failed: {}", e);
            return Err(e);
        }
        log_info!("Undo ({} checkpoint(s) left)", self.history.len());

        self.emit(EditorEvent::HistoryChanged { can_undo: self.history.can_undo() });
        self.emit(EditorEvent::BufferChanged);
        Ok(UndoOutcome::Restored)
    }

    /// Discard all edits and show the pixels as loaded.  Undo history is
    /// cleared when the config says so.
    pub fn reset(&mut self) -> bool {
        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        buffer.reset_to_original();
        self.tracker.reset();
        if self.config.reset_clears_history {
            self.history.clear();
        }
        log_info!("Reset to original (history kept: {})", !self.config.reset_clears_history);

        self.emit(EditorEvent::HistoryChanged { can_undo: self.history.can_undo() });
        self.emit(EditorEvent::BufferChanged);
        true
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Live pixels with the in-progress selection outlined, for display.
    /// The live buffer itself is not modified.
    pub fn preview(&self) -> Option<RgbaImage> {
        let buffer = self.buffer.as_ref()?;
        let region = self.tracker.region();
        if !region.active {
            return Some(buffer.live().clone());
        }
        let rect = region.to_pixel_rect(buffer.width(), buffer.height());
        Some(selection_outline(
            buffer.live(),
            rect,
            self.config.outline_width(buffer.short_side()),
            self.config.outline_dash,
            self.config.outline_color,
        ))
    }

    /// Suggested file name for exporting the current result.
    pub fn export_name(&self) -> String {
        io::export_filename(&self.name, self.mode)
    }

    pub fn encode_png(&self) -> Option<Result<Vec<u8>, ExportError>> {
        self.live_image().map(io::encode_png)
    }

    pub fn export_png(&self, path: &Path) -> Option<Result<(), ExportError>> {
        self.live_image().map(|img| io::export_png(img, path))
    }
}
