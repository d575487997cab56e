// ============================================================================
// PROCESSING ENGINE — apply a redaction mode to a selected region
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use image::RgbaImage;

use crate::canvas::{PixelRect, RasterBuffer, RasterError, UndoEntry};
use crate::components::history::UndoStack;
use crate::components::selection::SelectionRegion;
use crate::config::EditorConfig;
use crate::ops::effects::{BLACK, WHITE, fill_core, mosaic_core};
use crate::ops::filters::{blur_padding, blur_within};
use crate::log_info;

/// The four redaction operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ProcessingMode {
    #[default]
    FillBlack,
    FillWhite,
    Mosaic,
    Blur,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 4] = [
        ProcessingMode::FillBlack,
        ProcessingMode::FillWhite,
        ProcessingMode::Mosaic,
        ProcessingMode::Blur,
    ];

    /// Short lowercase name used in file names and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            ProcessingMode::FillBlack => "blackfill",
            ProcessingMode::FillWhite => "whitefill",
            ProcessingMode::Mosaic => "mosaic",
            ProcessingMode::Blur => "blur",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMode::FillBlack => "Fill Black",
            ProcessingMode::FillWhite => "Fill White",
            ProcessingMode::Mosaic => "Mosaic",
            ProcessingMode::Blur => "Blur",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blackfill" | "black" | "fill-black" => Ok(ProcessingMode::FillBlack),
            "whitefill" | "white" | "fill-white" => Ok(ProcessingMode::FillWhite),
            "mosaic" | "pixelate" => Ok(ProcessingMode::Mosaic),
            "blur" => Ok(ProcessingMode::Blur),
            other => Err(format!(
                "unknown mode '{}' (expected blackfill, whitefill, mosaic or blur)",
                other
            )),
        }
    }
}

/// Result of a processing call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Pixels inside `rect` were replaced.
    Applied { mode: ProcessingMode, rect: PixelRect },
    /// Zero-area region: nothing changed, but a checkpoint was recorded.
    Checkpointed,
    /// Zero-area region and checkpointing of empty regions is off.
    Skipped,
    /// No image is loaded.
    NoImage,
}

/// Replacement pixels for one operation plus the checkpoint preceding it.
pub struct Processed {
    pub rect: PixelRect,
    /// `None` for a zero-area region.
    pub block: Option<RgbaImage>,
    /// Snapshot of the buffer before the change, to be pushed first.
    pub checkpoint: Option<UndoEntry>,
}

/// Effect sizing and checkpoint policy, derived from [`EditorConfig`].
#[derive(Clone, Debug)]
pub struct ProcessingEngine {
    config: EditorConfig,
}

impl ProcessingEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Compute an operation without touching the buffer.
    pub fn compute(
        &self,
        mode: ProcessingMode,
        region: &SelectionRegion,
        buffer: &RasterBuffer,
    ) -> Result<Processed, RasterError> {
        let rect = region.to_pixel_rect(buffer.width(), buffer.height());
        if rect.is_empty() {
            return Ok(Processed {
                rect,
                block: None,
                checkpoint: self.config.checkpoint_degenerate.then(|| buffer.snapshot()),
            });
        }

        let block = self.render(mode, rect, buffer)?;
        Ok(Processed {
            rect,
            block: Some(block),
            checkpoint: Some(buffer.snapshot()),
        })
    }

    /// Apply `mode` to `region`: checkpoint into `history`, then write.
    pub fn apply(
        &self,
        mode: ProcessingMode,
        region: &SelectionRegion,
        buffer: &mut RasterBuffer,
        history: &mut UndoStack,
    ) -> Result<ProcessOutcome, RasterError> {
        let started = Instant::now();
        let Processed { rect, block, checkpoint } = self.compute(mode, region, buffer)?;

        let had_checkpoint = checkpoint.is_some();
        if let Some(entry) = checkpoint {
            history.push(entry);
        }

        let Some(block) = block else {
            log_info!("{} over empty region, checkpoint={}", mode.label(), had_checkpoint);
            return Ok(if had_checkpoint {
                ProcessOutcome::Checkpointed
            } else {
                ProcessOutcome::Skipped
            });
        };

        buffer.set_region(rect, &block)?;
        log_info!(
            "{} applied to {} in {:.1}ms",
            mode.label(),
            rect,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(ProcessOutcome::Applied { mode, rect })
    }

    /// Replacement pixels for `rect` under `mode`.
    pub fn render(
        &self,
        mode: ProcessingMode,
        rect: PixelRect,
        buffer: &RasterBuffer,
    ) -> Result<RgbaImage, RasterError> {
        let short_side = buffer.short_side();
        match mode {
            ProcessingMode::FillBlack => Ok(fill_core(rect.width, rect.height, BLACK)),
            ProcessingMode::FillWhite => Ok(fill_core(rect.width, rect.height, WHITE)),
            ProcessingMode::Mosaic => {
                let region = buffer.get_region(rect)?;
                Ok(mosaic_core(&region, self.config.mosaic_block_size(short_side)))
            }
            ProcessingMode::Blur => {
                let sigma = self.config.blur_radius(short_side) as f32;
                let (w, h) = buffer.dimensions();
                let context_rect = rect.expand(blur_padding(sigma), w, h);
                let context = buffer.get_region(context_rect)?;
                let inner = PixelRect::new(
                    rect.x - context_rect.x,
                    rect.y - context_rect.y,
                    rect.width,
                    rect.height,
                );
                Ok(blur_within(&context, inner, sigma))
            }
        }
    }
}
