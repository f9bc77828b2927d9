//! `inkpad-export`: render a saved shape list to PNG.
//!
//! Usage: `inkpad-export <input.json> <output.png> [width height]`

use clap::Parser;
use inkpad_core::{Canvas, Colour, PadOptions};
use inkpad_render::{RasterSurface, RenderError};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Debug, Error)]
enum ExportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to encode image: {0}")]
    Snapshot(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Parser, Debug)]
#[command(name = "inkpad-export", about = "Render a saved inkpad drawing to PNG")]
struct Args {
    /// JSON array of shape records.
    input: PathBuf,
    /// PNG file to write.
    output: PathBuf,
    #[arg(default_value_t = 800)]
    width: u32,
    #[arg(default_value_t = 600)]
    height: u32,
}

fn run(args: Args) -> Result<(), ExportError> {
    let json = std::fs::read_to_string(&args.input).map_err(|source| ExportError::Read {
        path: args.input.clone(),
        source,
    })?;

    let options = PadOptions::default()
        .with_background(Colour::white())
        .with_canvas_size(args.width as f64, args.height as f64);
    let surface = RasterSurface::new(args.width, args.height)?;
    let mut canvas = Canvas::new(surface, options);

    let count = canvas.deserialize(&json).map_err(|e| ExportError::Parse {
        path: args.input.clone(),
        message: e.to_string(),
    })?;
    log::info!("Rendering {} shapes at {}x{}", count, args.width, args.height);

    let png_data = canvas
        .snapshot()
        .map_err(|e| ExportError::Snapshot(e.to_string()))?;
    std::fs::write(&args.output, &png_data).map_err(RenderError::from)?;
    log::info!("Wrote {} ({} bytes)", args.output.display(), png_data.len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
