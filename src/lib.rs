//! bitrace: packed bitmap → nested cubic Bezier outlines.
//!
//! Traces the boundaries of the black regions of a bitmap, fits each
//! boundary with an optimal polygon, and turns the polygon into a closed
//! curve of corners and cubic Bezier segments. Outlines come back as a
//! forest mirroring how regions, holes and islands nest.
//!
//! # Example
//!
//! ```no_run
//! use bitrace::{trace, Bitmap, TraceParams};
//!
//! let bm = Bitmap::from_fn(64, 64, |x, y| (x as i32 - 32).pow(2) + (y as i32 - 32).pow(2) < 400)?;
//! let paths = trace(&bm, &TraceParams::default())?;
//! for group in paths.groups() {
//!     println!("{}", group.to_svg());
//! }
//! # Ok::<(), bitrace::TraceError>(())
//! ```

#![forbid(unsafe_code)]

mod bbox;
mod bitmap;
mod config;
mod geom;
mod path;
mod progress;
mod vectorize;

pub mod error;

// Re-export kurbo so downstream users get the same version used by
// the output types.
pub use kurbo;

pub use bbox::Interval;
pub use bitmap::Bitmap;
pub use config::{ThresholdMethod, TraceParams, TurnPolicy};
pub use error::TraceError;
pub use path::{Curve, PathList, Segment, SegmentTag, Sign, Siblings, TracedPath};
pub use progress::ProgressFn;

use progress::Progress;

/// Trace every black region of `bm`.
///
/// Fails only when `params` does not validate.
pub fn trace(bm: &Bitmap, params: &TraceParams) -> Result<PathList, TraceError> {
    params.validate()?;
    Ok(vectorize::trace(bm, params, &mut Progress::silent()))
}

/// Like [`trace`], reporting the completed fraction to `progress`.
///
/// Values passed to the callback never decrease and end with `1.0`;
/// before that, each call advances by at least `params.progress_epsilon`.
/// The callback may be called from worker threads, one call at a time.
pub fn trace_with_progress(bm: &Bitmap, params: &TraceParams, progress: ProgressFn<'_>) -> Result<PathList, TraceError> {
    params.validate()?;
    let mut progress = Progress::new(Some(progress), params.progress_epsilon);
    Ok(vectorize::trace(bm, params, &mut progress))
}
