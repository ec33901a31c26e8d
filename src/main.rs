use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::time::Instant;

use bitrace::kurbo::Affine;
use bitrace::{Bitmap, PathList, SegmentTag, Sign, ThresholdMethod, TraceParams, TurnPolicy};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bitrace", about = "Trace a bitmap image into SVG outlines")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP, ...)
    #[arg(short, long)]
    input: PathBuf,

    /// Output SVG path
    #[arg(short, long)]
    output: PathBuf,

    /// Fixed brightness threshold (0-255); darker pixels are black.
    /// Overrides Otsu auto-detection.
    #[arg(long)]
    threshold: Option<u8>,

    /// Invert the image before tracing
    #[arg(long)]
    invert: bool,

    /// Drop outlines enclosing at most this many pixels
    #[arg(short, long, default_value = "2")]
    turdsize: u32,

    /// How ambiguous diagonal pixels are resolved:
    /// black, white, left, right, minority, majority, random
    #[arg(short = 'z', long, default_value = "minority")]
    turnpolicy: TurnPolicy,

    /// Corner threshold (0 = polygon, above 1.34 = no corners)
    #[arg(short, long, default_value = "1.0")]
    alphamax: f64,

    /// Keep every smoothed segment instead of merging runs into longer curves
    #[arg(short = 'n', long)]
    no_opticurve: bool,

    /// Maximum error introduced by merging curve segments, in pixels
    #[arg(short = 'O', long, default_value = "0.2")]
    opttolerance: f64,

    /// Floor output coordinates to multiples of 1/N
    #[arg(short, long)]
    quantize: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let t_start = Instant::now();

    let params = TraceParams {
        turd_size: cli.turdsize,
        turn_policy: cli.turnpolicy,
        alpha_max: cli.alphamax,
        opti_curve: !cli.no_opticurve,
        opt_tolerance: cli.opttolerance,
        quantize_unit: cli.quantize,
        ..TraceParams::default()
    };
    params.validate()?;

    eprintln!();
    eprintln!("  bitrace \u{00b7} {}", cli.input.display());
    eprintln!();

    // ── Load & threshold ──────────────────────────────────
    let method = match cli.threshold {
        Some(t) => ThresholdMethod::Fixed(t),
        None => ThresholdMethod::Otsu,
    };
    let (mut bm, level) = Bitmap::open(&cli.input, method)?;
    if cli.invert {
        bm = Bitmap::from_fn(bm.width(), bm.height(), |x, y| !bm.get(x as i32, y as i32))?;
    }
    let threshold_name = match method {
        ThresholdMethod::Otsu => "Otsu",
        ThresholdMethod::Fixed(_) => "fixed",
    };
    eprintln!(
        "  Load        {}x{} px, {} threshold {} \u{00b7} {} black",
        bm.width(),
        bm.height(),
        threshold_name,
        level,
        bm.count_black()
    );

    // ── Trace ─────────────────────────────────────────────
    let paths = bitrace::trace(&bm, &params)?;
    let (curves, corners) = count_segments(&paths);
    let holes = paths.iter().filter(|p| p.sign == Sign::Negative).count();
    eprintln!(
        "  Trace       {} outlines ({} holes) \u{2192} {} curves + {} corners",
        paths.len(),
        holes,
        curves,
        corners
    );

    // ── Write ─────────────────────────────────────────────
    std::fs::write(&cli.output, to_svg(&paths, bm.width(), bm.height())?)?;

    eprintln!("  Done        {}ms", t_start.elapsed().as_millis());
    eprintln!();
    eprintln!("  \u{2713} {}", cli.output.display());

    Ok(())
}

/// Count (curve, corner) segments over all outlines.
fn count_segments(paths: &PathList) -> (usize, usize) {
    let mut curves = 0;
    let mut corners = 0;
    for seg in paths.iter().flat_map(|p| &p.curve.segments) {
        match seg.tag {
            SegmentTag::CurveTo => curves += 1,
            SegmentTag::Corner => corners += 1,
        }
    }
    (curves, corners)
}

/// One even-odd filled `<path>` per black region, flipped back to image
/// coordinates (y down).
fn to_svg(paths: &PathList, width: usize, height: usize) -> Result<String, fmt::Error> {
    let flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, height as f64]);
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    )?;
    for mut group in paths.groups() {
        group.apply_affine(flip);
        writeln!(svg, r#"  <path fill="black" fill-rule="evenodd" d="{}"/>"#, group.to_svg())?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}
