// ============================================================================
// EDITOR CONFIGURATION — tunable constants for one editing session
// ============================================================================

use image::Rgba;

/// Default number of undo checkpoints kept per session.
pub const DEFAULT_UNDO_CAPACITY: usize = 16;
/// A drag must exceed this many buffer pixels on both axes to commit.
pub const DEFAULT_SELECTION_THRESHOLD: f32 = 5.0;
/// Longest side a loaded image may have before it is downscaled.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Session-wide settings.  Every value has a sensible default; the CLI and
/// host applications override individual fields with the `with_*` methods.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    /// Maximum undo checkpoints; the oldest is evicted beyond this.
    pub undo_capacity: usize,
    /// Minimum drag extent (exclusive) on each axis, in buffer pixels.
    pub selection_threshold: f32,
    /// Whether `reset` also empties the undo history.
    pub reset_clears_history: bool,
    /// Whether a zero-area processing call still records a checkpoint.
    pub checkpoint_degenerate: bool,
    /// Longest side allowed for a loaded image.
    pub max_dimension: u32,
    pub mosaic_min_block: u32,
    pub mosaic_divisor: u32,
    pub blur_min_radius: u32,
    pub blur_divisor: u32,
    /// Selection outline overlay.
    pub outline_color: Rgba<u8>,
    pub outline_min_width: u32,
    pub outline_divisor: u32,
    pub outline_dash: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            selection_threshold: DEFAULT_SELECTION_THRESHOLD,
            reset_clears_history: true,
            checkpoint_degenerate: true,
            max_dimension: DEFAULT_MAX_DIMENSION,
            mosaic_min_block: 4,
            mosaic_divisor: 80,
            blur_min_radius: 2,
            blur_divisor: 100,
            outline_color: Rgba([255, 0, 0, 255]),
            outline_min_width: 4,
            outline_divisor: 150,
            outline_dash: 5,
        }
    }
}

impl EditorConfig {
    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo_capacity = capacity;
        self
    }

    pub fn with_selection_threshold(mut self, threshold: f32) -> Self {
        self.selection_threshold = threshold.max(0.0);
        self
    }

    pub fn with_reset_clears_history(mut self, clears: bool) -> Self {
        self.reset_clears_history = clears;
        self
    }

    pub fn with_checkpoint_degenerate(mut self, checkpoint: bool) -> Self {
        self.checkpoint_degenerate = checkpoint;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    /// Mosaic cell edge for a buffer whose shorter side is `short_side`.
    pub fn mosaic_block_size(&self, short_side: u32) -> u32 {
        (short_side / self.mosaic_divisor.max(1)).max(self.mosaic_min_block.max(1))
    }

    /// Blur radius for a buffer whose shorter side is `short_side`.
    pub fn blur_radius(&self, short_side: u32) -> u32 {
        (short_side / self.blur_divisor.max(1)).max(self.blur_min_radius)
    }

    /// Selection outline stroke width.
    pub fn outline_width(&self, short_side: u32) -> u32 {
        (short_side / self.outline_divisor.max(1)).max(self.outline_min_width)
    }
}
