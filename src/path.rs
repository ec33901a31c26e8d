//! Public tracing output: closed curves arranged in a nesting forest.

use kurbo::{BezPath, Point};

/// Kind of a curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentTag {
    /// Two straight lines: to `c[1]` (the corner) and on to `c[2]`.
    /// `c[0]` is unused and left at the origin.
    Corner,
    /// A cubic Bezier with control points `c[0]`, `c[1]`, ending at `c[2]`.
    CurveTo,
}

/// One segment of a closed curve. It starts where the previous segment
/// ends; the first segment starts at the end of the last one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub tag: SegmentTag,
    pub c: [Point; 3],
}

impl Segment {
    pub fn corner(vertex: Point, end: Point) -> Self {
        Segment { tag: SegmentTag::Corner, c: [Point::ZERO, vertex, end] }
    }

    pub fn curve_to(c0: Point, c1: Point, end: Point) -> Self {
        Segment { tag: SegmentTag::CurveTo, c: [c0, c1, end] }
    }

    /// Endpoint of the segment.
    pub fn end(&self) -> Point {
        self.c[2]
    }

    /// The control points that carry meaning for this tag.
    pub fn points(&self) -> &[Point] {
        match self.tag {
            SegmentTag::Corner => &self.c[1..],
            SegmentTag::CurveTo => &self.c,
        }
    }
}

/// A closed loop of segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    pub segments: Vec<Segment>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Where traversal starts and ends: the endpoint of the last segment.
    pub fn start_point(&self) -> Option<Point> {
        self.segments.last().map(Segment::end)
    }

    /// Convert to a closed kurbo path.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(start) = self.start_point() else {
            return path;
        };
        path.move_to(start);
        for seg in &self.segments {
            match seg.tag {
                SegmentTag::Corner => {
                    path.line_to(seg.c[1]);
                    path.line_to(seg.c[2]);
                }
                SegmentTag::CurveTo => path.curve_to(seg.c[0], seg.c[1], seg.c[2]),
            }
        }
        path.close_path();
        path
    }

    /// Floor every control point coordinate to a multiple of `1 / unit`.
    pub(crate) fn quantize(&mut self, unit: u32) {
        let q = f64::from(unit);
        for seg in &mut self.segments {
            for p in &mut seg.c {
                p.x = (p.x * q).floor() / q;
                p.y = (p.y * q).floor() / q;
            }
        }
    }
}

/// Orientation of a traced boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Outer boundary of a black region.
    Positive,
    /// Boundary of a white hole inside a black region.
    Negative,
}

/// A traced outline together with its place in the nesting tree.
///
/// Tree links are indices into the owning [`PathList`].
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    /// Enclosed area in pixels.
    pub area: i64,
    pub sign: Sign,
    pub curve: Curve,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub next_sibling: Option<usize>,
}

/// All outlines of a traced bitmap.
///
/// Paths are stored depth-first: each black region is followed by its
/// holes, then the islands inside those holes, then the next region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathList {
    pub paths: Vec<TracedPath>,
}

impl PathList {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TracedPath> {
        self.paths.iter()
    }

    /// Indices of the top-level paths.
    pub fn roots(&self) -> Siblings<'_> {
        Siblings { list: self, next: (!self.paths.is_empty()).then_some(0) }
    }

    /// Indices of the paths nested directly inside path `i`.
    pub fn children(&self, i: usize) -> Siblings<'_> {
        Siblings { list: self, next: self.paths.get(i).and_then(|p| p.first_child) }
    }

    /// One compound path per black region: its outline followed by the
    /// outlines of its holes. Fill with the even-odd rule.
    pub fn groups(&self) -> Vec<BezPath> {
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.sign == Sign::Positive)
            .map(|(i, p)| {
                let mut group = p.curve.to_bezpath();
                for child in self.children(i) {
                    group.extend(self.paths[child].curve.to_bezpath().elements().iter().copied());
                }
                group
            })
            .collect()
    }

    /// Total number of segments over all paths.
    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(|p| p.curve.len()).sum()
    }
}

impl<'a> IntoIterator for &'a PathList {
    type Item = &'a TracedPath;
    type IntoIter = std::slice::Iter<'a, TracedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Iterator over a sibling chain of a [`PathList`].
#[derive(Debug, Clone)]
pub struct Siblings<'a> {
    list: &'a PathList,
    next: Option<usize>,
}

impl Iterator for Siblings<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = self.next?;
        self.next = self.list.paths.get(i).and_then(|p| p.next_sibling);
        Some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Shape};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Curve {
        Curve {
            segments: vec![
                Segment::corner(Point::new(x1, y0), Point::new(x1, (y0 + y1) / 2.0)),
                Segment::corner(Point::new(x1, y1), Point::new((x0 + x1) / 2.0, y1)),
                Segment::corner(Point::new(x0, y1), Point::new(x0, (y0 + y1) / 2.0)),
                Segment::corner(Point::new(x0, y0), Point::new((x0 + x1) / 2.0, y0)),
            ],
        }
    }

    fn node(sign: Sign, curve: Curve, parent: Option<usize>, first_child: Option<usize>, next_sibling: Option<usize>) -> TracedPath {
        TracedPath { area: 0, sign, curve, parent, first_child, next_sibling }
    }

    #[test]
    fn bezpath_starts_at_last_endpoint_and_closes() {
        let curve = square(0.0, 0.0, 4.0, 4.0);
        let path = curve.to_bezpath();
        let els = path.elements();
        assert_eq!(els.first(), Some(&PathEl::MoveTo(Point::new(2.0, 0.0))));
        assert_eq!(els.len(), 1 + 2 * 4 + 1);
        assert_eq!(els[els.len() - 2], PathEl::LineTo(Point::new(2.0, 0.0)));
        assert_eq!(els.last(), Some(&PathEl::ClosePath));
        assert!((path.area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn empty_curve_gives_empty_bezpath() {
        assert!(Curve::default().to_bezpath().elements().is_empty());
    }

    #[test]
    fn quantize_floors_to_grid() {
        let mut curve = Curve {
            segments: vec![Segment::curve_to(Point::new(0.26, -0.26), Point::new(1.99, 3.5), Point::new(2.0, 0.74))],
        };
        curve.quantize(2);
        assert_eq!(curve.segments[0].c, [Point::new(0.0, -0.5), Point::new(1.5, 3.5), Point::new(2.0, 0.5)]);
    }

    #[test]
    fn groups_combine_region_with_its_holes() {
        // 0: outer, 1: hole in 0, 2: island in 1, 3: second outer.
        let list = PathList {
            paths: vec![
                node(Sign::Positive, square(0.0, 0.0, 10.0, 10.0), None, Some(1), Some(3)),
                node(Sign::Negative, square(2.0, 2.0, 8.0, 8.0), Some(0), Some(2), None),
                node(Sign::Positive, square(4.0, 4.0, 6.0, 6.0), Some(1), None, None),
                node(Sign::Positive, square(20.0, 0.0, 22.0, 2.0), None, None, None),
            ],
        };
        assert_eq!(list.roots().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(list.children(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(list.children(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(list.children(9).count(), 0);

        let groups = list.groups();
        assert_eq!(groups.len(), 3);
        let moves = groups[0].elements().iter().filter(|e| matches!(e, PathEl::MoveTo(_))).count();
        assert_eq!(moves, 2);
        assert_eq!(list.segment_count(), 16);
    }
}
