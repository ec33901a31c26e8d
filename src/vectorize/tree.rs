//! Nesting tree of traced paths.
//!
//! Paths come out of the contour tracer in scan order, which already puts
//! every path before the paths it contains. Each path is taken in turn as
//! a candidate parent: its interior is rendered into a scratch bitmap and
//! the remaining paths are split into those whose top-left pixel lands
//! inside it (children) and the rest (siblings). Both groups go back on a
//! worklist, so deep or wide nestings never recurse.

use crate::bitmap::Bitmap;

use super::decompose::{xor_path, PixelPath};

/// Tree position of one path. All links are indices into the flat,
/// depth-first ordered node vector returned by [`build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode {
    /// Index of the path in the scan-ordered input.
    pub path: usize,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub next_sibling: Option<usize>,
}

/// Arrange scan-ordered `paths` into a forest.
///
/// `scratch` must have the bitmap's dimensions; it is cleared on entry
/// and left white. The result lists each region, then its holes, then
/// the contents of each hole (recursively), then the region's next
/// sibling.
pub fn build(paths: &[PixelPath], scratch: &mut Bitmap) -> Vec<TreeNode> {
    let n = paths.len();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut first_child: Vec<Option<usize>> = vec![None; n];
    let mut next_sibling: Vec<Option<usize>> = vec![None; n];

    scratch.clear_all();

    // ── Classify ─────────────────────────────────────────
    let mut work: Vec<Vec<usize>> = Vec::new();
    if n > 0 {
        work.push((0..n).collect());
    }
    while let Some(list) = work.pop() {
        let Some((&head, rest)) = list.split_first() else {
            continue;
        };

        xor_path(scratch, &paths[head]);
        let (x0, x1, y0, y1) = paths[head].bbox();

        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for (pos, &p) in rest.iter().enumerate() {
            let (px, py) = paths[p].points[0];
            // Everything from here on starts below the head: outside.
            if py <= y0 {
                outside.extend_from_slice(&rest[pos..]);
                break;
            }
            if scratch.get(px, py - 1) {
                inside.push(p);
            } else {
                outside.push(p);
            }
        }

        scratch.clear_bbox(x0, x1, y0, y1);

        for &c in &inside {
            parent[c] = Some(head);
        }
        for &o in &outside {
            parent[o] = parent[head];
        }
        first_child[head] = inside.first().copied();
        next_sibling[head] = outside.first().copied();

        if !outside.is_empty() {
            work.push(outside);
        }
        if !inside.is_empty() {
            work.push(inside);
        }
    }

    // ── Flatten depth-first ──────────────────────────────
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = Vec::new();
    if n > 0 {
        stack.push(0);
    }
    while let Some(p) = stack.pop() {
        order.push(p);
        let holes: Vec<usize> = std::iter::successors(first_child[p], |&i| next_sibling[i]).collect();
        order.extend_from_slice(&holes);
        if let Some(s) = next_sibling[p] {
            stack.push(s);
        }
        for &h in holes.iter().rev() {
            if let Some(c) = first_child[h] {
                stack.push(c);
            }
        }
    }
    debug_assert_eq!(order.len(), n);

    let mut position = vec![0usize; n];
    for (k, &i) in order.iter().enumerate() {
        position[i] = k;
    }
    let remap = |link: Option<usize>| link.map(|i| position[i]);

    order
        .iter()
        .map(|&i| TreeNode {
            path: i,
            parent: remap(parent[i]),
            first_child: remap(first_child[i]),
            next_sibling: remap(next_sibling[i]),
        })
        .collect()
}
