//! Vectorization pipeline: bitmap → nested Bezier outlines.
//!
//! 1. Pixel-edge contour extraction on the dual grid (`decompose`)
//! 2. Nesting tree and depth-first ordering (`tree`)
//! 3. Optimal polygon approximation by DP (`polygon`)
//! 4. Sub-pixel vertex refinement (`adjust`)
//! 5. Alpha-based corner detection and Bezier generation (`curve`)
//! 6. Optional merging of Bezier runs (`opticurve`)
//!
//! Stages 3 to 6 see one path at a time and run in parallel across paths.

pub mod adjust;
pub mod curve;
pub mod decompose;
pub mod opticurve;
pub mod polygon;
pub mod tree;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::bitmap::Bitmap;
use crate::config::TraceParams;
use crate::path::{Curve, PathList, Sign, TracedPath};
use crate::progress::Progress;

use decompose::PixelPath;

/// Share of the progress range spent on contour extraction.
const DECOMPOSE_SHARE: f64 = 0.1;

/// Run the full pipeline. `params` must already be validated.
pub(crate) fn trace(bm: &Bitmap, params: &TraceParams, progress: &mut Progress<'_>) -> PathList {
    // Stage 1: contours, in scan order.
    let mut sub = progress.subrange(0.0, DECOMPOSE_SHARE);
    let (pixel_paths, mut scratch) = decompose::decompose(bm, params.turd_size, params.turn_policy, &mut sub);
    progress.end_subrange(sub);

    // Stage 2: nesting.
    let nodes = tree::build(&pixel_paths, &mut scratch);
    drop(scratch);

    let mut paths: Vec<TracedPath> = nodes
        .iter()
        .map(|node| {
            let pp = &pixel_paths[node.path];
            TracedPath {
                area: pp.area,
                sign: pp.sign,
                curve: Curve::default(),
                parent: node.parent,
                first_child: node.first_child,
                next_sibling: node.next_sibling,
            }
        })
        .collect();

    // Stages 3-6: per-path fitting. Progress is the share of path length
    // done so far, so long outlines weigh more than specks.
    let total: usize = pixel_paths.iter().map(|p| p.points.len()).sum();
    let done = AtomicUsize::new(0);
    let fit = progress.subrange(DECOMPOSE_SHARE, 1.0);
    let report = fit.is_active();
    let fit_progress = Mutex::new(fit);

    paths.par_iter_mut().zip(nodes.par_iter()).for_each(|(out, node)| {
        let pp = &pixel_paths[node.path];
        out.curve = fit_path(pp, params);

        let len = pp.points.len();
        let finished = done.fetch_add(len, Ordering::Relaxed) + len;
        if report {
            let mut p = fit_progress.lock().unwrap_or_else(PoisonError::into_inner);
            p.update(finished as f64 / total as f64);
        }
    });

    let mut fit = fit_progress.into_inner().unwrap_or_else(PoisonError::into_inner);
    if total == 0 {
        fit.update(1.0);
    }
    progress.end_subrange(fit);

    if let Some(unit) = params.quantize_unit {
        for p in &mut paths {
            p.curve.quantize(unit);
        }
    }

    let list = PathList { paths };
    log::debug!(
        "trace: {}x{} bitmap, {} paths, {} segments",
        bm.width(),
        bm.height(),
        list.len(),
        list.segment_count()
    );
    list
}

/// Fit one pixel path: polygon, vertex refinement, smoothing and the
/// optional curve optimization.
fn fit_path(path: &PixelPath, params: &TraceParams) -> Curve {
    let pt = &path.points;
    let sums = polygon::calc_sums(pt);
    let lon = polygon::calc_lon(pt);
    let po = polygon::best_polygon(pt, &lon, &sums);

    let mut vertices = adjust::adjust_vertices(pt, &po, &sums);
    // Holes are traced with the same orientation as their parents;
    // reversing makes them run the other way.
    if path.sign == Sign::Negative {
        vertices.reverse();
    }

    let nodes = curve::smooth(&vertices, params.alpha_max);
    let curve = if params.opti_curve {
        opticurve::opticurve(&nodes, params.opt_tolerance)
    } else {
        curve::to_curve(&nodes)
    };

    log::trace!(
        "path area {}: {} points, {} vertices, {} segments",
        path.area,
        pt.len(),
        po.len(),
        curve.len()
    );
    curve
}
