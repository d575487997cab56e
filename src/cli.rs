// ============================================================================
// RedactFE CLI — headless batch redaction via command-line arguments
// ============================================================================
//
// Usage examples:
//   RedactFE -i scan.jpg -r 120,80,480,160 -m blackfill
//   RedactFE -i scan.jpg -r 10,10,200,90 -r 300,40,420,120:blur -o out.png
//   RedactFE -i "shots/*.png" -r 0,0,400,60 -m mosaic --output-dir redacted/
//
// Each region is applied in order through a regular editing session, exactly
// as if it had been dragged on screen, then the result is written as PNG.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::components::selection::SelectionRegion;
use crate::config::{DEFAULT_MAX_DIMENSION, EditorConfig};
use crate::io::export_filename;
use crate::ops::processing::{ProcessOutcome, ProcessingMode};
use crate::project::EditingSession;
use crate::{log_err, log_info, log_warn};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// One region to redact, optionally with its own mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionSpec {
    pub region: SelectionRegion,
    pub mode: Option<ProcessingMode>,
}

/// RedactFE headless redaction.
///
/// Black out, white out, pixelate or blur rectangles in image files.
#[derive(Parser, Debug)]
#[command(
    name = "RedactFE",
    about = "Redact rectangular regions of images without a GUI",
    long_about = "Apply solid fills, mosaic or blur to rectangular regions of image\n\
                  files and write the result as PNG.\n\n\
                  Regions are given in image pixels as x0,y0,x1,y1 (any corner order),\n\
                  optionally suffixed with :MODE to override --mode for that region.\n\n\
                  Example:\n  \
                  RedactFE -i scan.jpg -r 120,80,480,160 -r 40,500,300,540:blur"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Region to process: x0,y0,x1,y1[:MODE]. Repeatable; applied in order.
    #[arg(short, long = "region", required = true, value_parser = parse_region, value_name = "X0,Y0,X1,Y1[:MODE]")]
    pub regions: Vec<RegionSpec>,

    /// Default mode: blackfill, whitefill, mosaic, blur.
    #[arg(short, long, default_value = "blackfill")]
    pub mode: ProcessingMode,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Longest side allowed before inputs are downscaled.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, value_name = "PIXELS")]
    pub max_dimension: u32,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    fn editor_config(&self) -> EditorConfig {
        EditorConfig::default().with_max_dimension(self.max_dimension)
    }
}

/// Parse `x0,y0,x1,y1` with an optional `:mode` suffix.
pub fn parse_region(s: &str) -> Result<RegionSpec, String> {
    let (coords, mode) = match s.split_once(':') {
        Some((coords, mode)) => (coords, Some(mode.parse::<ProcessingMode>()?)),
        None => (s, None),
    };

    let values: Vec<f32> = coords
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|_| format!("'{}' is not a number", v.trim()))
        })
        .collect::<Result<_, _>>()?;
    let [x0, y0, x1, y1] = values[..] else {
        return Err(format!("expected 4 coordinates, got {}", values.len()));
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err("coordinates must be finite".to_string());
    }

    Ok(RegionSpec {
        region: SelectionRegion::from_corners(x0, y0, x1, y1),
        mode,
    })
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let config = args.editor_config();
    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let last_mode = args
            .regions
            .last()
            .and_then(|r| r.mode)
            .unwrap_or(args.mode);
        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            last_mode,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &args.regions, args.mode, &config) {
            Ok(applied) => {
                log_info!("{} -> {} ({} region(s))", input_path.display(), output_path.display(), applied);
                if args.verbose || multi {
                    println!(
                        "  → {} ({} region(s), {:.0}ms)",
                        output_path.display(),
                        applied,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

/// Load, redact every region, save.  Returns how many regions changed pixels.
pub fn run_one(
    input: &Path,
    output: &Path,
    regions: &[RegionSpec],
    default_mode: ProcessingMode,
    config: &EditorConfig,
) -> Result<usize, String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut session = EditingSession::new(config.clone());
    session
        .open(input)
        .map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Apply regions -------------------------------------------
    let mut applied = 0;
    for spec in regions {
        let mode = spec.mode.unwrap_or(default_mode);
        session.set_mode(mode);
        match session
            .apply(mode, &spec.region)
            .map_err(|e| format!("{} failed: {}", mode.label(), e))?
        {
            ProcessOutcome::Applied { .. } => applied += 1,
            _ => {
                log_warn!(
                    "Region ({},{})-({},{}) lies outside the image; skipped",
                    spec.region.start_x,
                    spec.region.start_y,
                    spec.region.end_x,
                    spec.region.end_y
                );
            }
        }
    }

    // -- Step 3: Save ----------------------------------------------------
    session
        .export_png(output)
        .ok_or_else(|| "no image loaded".to_string())?
        .map_err(|e| format!("save failed: {}", e))?;

    Ok(applied)
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, export name derived from the input)
/// 3. Fallback: next to the input, using the export name
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    mode: ProcessingMode,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let file_name = input.file_name()?.to_string_lossy().into_owned();
    let name = export_filename(&file_name, mode);

    if let Some(dir) = output_dir {
        return Some(dir.join(name));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(name))
}
