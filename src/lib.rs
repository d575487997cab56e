// ============================================================================
// RedactFE — interactive region redaction engine
// ============================================================================
//
// Select a rectangle over a loaded raster image and black it out, white it
// out, pixelate it or blur it.  Every mutation is checkpointed so it can be
// undone, and the originally loaded pixels are always available for reset.

pub mod logger;

pub mod canvas;
pub mod cli;
pub mod components;
pub mod config;
pub mod input;
pub mod io;
pub mod ops;
pub mod project;

pub use canvas::{PixelRect, RasterBuffer, RasterError, UndoEntry};
pub use components::history::UndoStack;
pub use components::selection::{
    FrameHandle, FrameScheduler, ManualFrameClock, SelectionRegion, SelectionSignal,
    SelectionTracker,
};
pub use config::EditorConfig;
pub use input::{BufferPoint, CanvasMetrics, ClientRect, InputEvent, PointerKind, PointerPhase};
pub use ops::processing::{ProcessOutcome, ProcessingEngine, ProcessingMode};
pub use project::{EditingSession, EditorEvent, UndoOutcome};
