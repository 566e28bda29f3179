//! Flat feature/ring/vertex layout of a polygon dataset.
//!
//! Rings and features are stored as exclusive upper offsets into the next
//! level down, the same layout the accelerated pipeline consumes, so masks
//! computed here can be compared against it index for index.

use std::ops::Range;

use geo::{Coord, CoordFloat, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use super::sequential::{point_in_feature, ring_parity};
use crate::error::{BoundaryKind, PipError, Result};

/// Per-point membership bits, one per feature.
pub type FeatureMask = u32;

/// Largest feature count a [`FeatureMask`] can describe.
pub const MAX_FEATURES: usize = FeatureMask::BITS as usize;

/// Unchecked flat components of a [`PolygonSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSetParts<T> {
    pub feature_boundaries: Vec<u32>,
    pub ring_boundaries: Vec<u32>,
    pub x: Vec<T>,
    pub y: Vec<T>,
}

/// A validated polygon dataset in flat offset encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "PolygonSetParts<T>",
    bound(deserialize = "T: CoordFloat + Deserialize<'de>")
)]
pub struct PolygonSet<T> {
    feature_boundaries: Vec<u32>,
    ring_boundaries: Vec<u32>,
    x: Vec<T>,
    y: Vec<T>,
}

impl<T: CoordFloat> PolygonSet<T> {
    /// Build a dataset from its flat components.
    ///
    /// Rejects more than [`MAX_FEATURES`] features, x/y sequences of different
    /// lengths, decreasing offsets, and offsets that leave rings or vertices
    /// unowned.
    pub fn new(
        feature_boundaries: Vec<u32>,
        ring_boundaries: Vec<u32>,
        x: Vec<T>,
        y: Vec<T>,
    ) -> Result<Self> {
        if x.len() != y.len() {
            return Err(PipError::CoordinateLengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if feature_boundaries.len() > MAX_FEATURES {
            return Err(PipError::TooManyFeatures {
                count: feature_boundaries.len(),
                max: MAX_FEATURES,
            });
        }
        check_boundaries(BoundaryKind::Feature, &feature_boundaries, ring_boundaries.len())?;
        check_boundaries(BoundaryKind::Ring, &ring_boundaries, x.len())?;

        Ok(Self {
            feature_boundaries,
            ring_boundaries,
            x,
            y,
        })
    }

    /// Build a dataset from nested rings; each feature is a list of rings and
    /// each ring is stored exactly as given, without closing it.
    pub fn from_features(features: &[Vec<Vec<Coord<T>>>]) -> Result<Self> {
        let mut builder = Builder::default();
        for rings in features {
            for ring in rings {
                builder.push_ring(ring.iter().copied());
            }
            builder.end_feature();
        }
        builder.finish()
    }

    /// One feature per polygon: the exterior ring followed by its interiors.
    pub fn from_polygons(polygons: &[Polygon<T>]) -> Result<Self> {
        let mut builder = Builder::default();
        for polygon in polygons {
            builder.push_polygon(polygon);
            builder.end_feature();
        }
        builder.finish()
    }

    /// One feature per multi-polygon, holding every ring of every member.
    pub fn from_multi_polygons(multi_polygons: &[MultiPolygon<T>]) -> Result<Self> {
        let mut builder = Builder::default();
        for multi_polygon in multi_polygons {
            for polygon in multi_polygon.iter() {
                builder.push_polygon(polygon);
            }
            builder.end_feature();
        }
        builder.finish()
    }

    /// Whether `point` lies inside `feature` under the even-odd rule.
    pub fn contains(&self, point: Coord<T>, feature: usize) -> bool {
        point_in_feature(point.x, point.y, self, feature)
    }

    /// Rings of `feature` as stored, one coordinate list per ring.
    pub fn feature_rings(&self, feature: usize) -> Vec<Vec<Coord<T>>> {
        self.ring_range(feature)
            .map(|ring| self.coords(self.vertex_range(ring)).collect())
            .collect()
    }

    /// Read `feature` back as a `geo` multi-polygon.
    ///
    /// A ring becomes a hole of the latest polygon whose filled area (exterior
    /// minus holes so far) contains its first vertex, otherwise it starts a new
    /// polygon, so an island inside a hole comes back as its own polygon.
    ///
    /// `geo` closes every ring. An open ring therefore gains its closing edge,
    /// and feeding the result back through [`Self::from_multi_polygons`] can
    /// change membership for such rings.
    pub fn to_multi_polygon(&self, feature: usize) -> MultiPolygon<T> {
        let mut parts: Vec<(Range<usize>, Vec<Range<usize>>)> = Vec::new();

        for ring in self.ring_range(feature) {
            let vertices = self.vertex_range(ring);
            let owner = vertices.clone().next().and_then(|first| {
                let (x, y) = (self.x[first], self.y[first]);
                parts.iter().rposition(|(outer, holes)| {
                    holes
                        .iter()
                        .chain(std::iter::once(outer))
                        .fold(false, |inside, r| {
                            inside ^ ring_parity(x, y, &self.x[r.clone()], &self.y[r.clone()])
                        })
                })
            });

            match owner {
                Some(index) => parts[index].1.push(vertices),
                None => parts.push((vertices, Vec::new())),
            }
        }

        let polygons = parts
            .into_iter()
            .map(|(outer, holes)| {
                let interiors = holes.into_iter().map(|r| self.line_string(r)).collect();
                Polygon::new(self.line_string(outer), interiors)
            })
            .collect();
        MultiPolygon::new(polygons)
    }

    fn coords(&self, vertices: Range<usize>) -> impl Iterator<Item = Coord<T>> + '_ {
        self.x[vertices.clone()]
            .iter()
            .zip(&self.y[vertices])
            .map(|(&x, &y)| Coord { x, y })
    }

    fn line_string(&self, vertices: Range<usize>) -> LineString<T> {
        LineString::new(self.coords(vertices).collect())
    }
}

impl<T> PolygonSet<T> {
    pub fn num_features(&self) -> usize {
        self.feature_boundaries.len()
    }

    pub fn num_rings(&self) -> usize {
        self.ring_boundaries.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_boundaries.is_empty()
    }

    /// Ring indices belonging to `feature`.
    pub fn ring_range(&self, feature: usize) -> Range<usize> {
        span(&self.feature_boundaries, feature)
    }

    /// Vertex indices belonging to `ring`.
    pub fn vertex_range(&self, ring: usize) -> Range<usize> {
        span(&self.ring_boundaries, ring)
    }

    pub fn feature_boundaries(&self) -> &[u32] {
        &self.feature_boundaries
    }

    pub fn ring_boundaries(&self) -> &[u32] {
        &self.ring_boundaries
    }

    pub fn x(&self) -> &[T] {
        &self.x
    }

    pub fn y(&self) -> &[T] {
        &self.y
    }

    pub fn into_parts(self) -> PolygonSetParts<T> {
        PolygonSetParts {
            feature_boundaries: self.feature_boundaries,
            ring_boundaries: self.ring_boundaries,
            x: self.x,
            y: self.y,
        }
    }
}

impl<T: CoordFloat> TryFrom<PolygonSetParts<T>> for PolygonSet<T> {
    type Error = PipError;

    fn try_from(parts: PolygonSetParts<T>) -> Result<Self> {
        Self::new(
            parts.feature_boundaries,
            parts.ring_boundaries,
            parts.x,
            parts.y,
        )
    }
}

/// `[boundaries[index - 1], boundaries[index])`, lower bound 0 for index 0.
fn span(boundaries: &[u32], index: usize) -> Range<usize> {
    let start = if index == 0 {
        0
    } else {
        boundaries[index - 1] as usize
    };
    start..boundaries[index] as usize
}

fn check_boundaries(kind: BoundaryKind, boundaries: &[u32], children: usize) -> Result<()> {
    for (index, pair) in boundaries.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(PipError::DecreasingBoundary {
                kind,
                index: index + 1,
                value: pair[1],
                previous: pair[0],
            });
        }
    }

    let last = boundaries.last().copied().unwrap_or(0);
    if last as usize != children {
        return Err(PipError::BoundaryMismatch {
            kind,
            last,
            expected: children,
        });
    }

    Ok(())
}

/// Accumulates nested rings into the flat encoding.
struct Builder<T> {
    feature_ends: Vec<usize>,
    ring_ends: Vec<usize>,
    x: Vec<T>,
    y: Vec<T>,
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self {
            feature_ends: Vec::new(),
            ring_ends: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
        }
    }
}

impl<T: CoordFloat> Builder<T> {
    fn push_ring(&mut self, coords: impl Iterator<Item = Coord<T>>) {
        for coord in coords {
            self.x.push(coord.x);
            self.y.push(coord.y);
        }
        self.ring_ends.push(self.x.len());
    }

    fn push_polygon(&mut self, polygon: &Polygon<T>) {
        self.push_ring(polygon.exterior().coords().copied());
        for interior in polygon.interiors() {
            self.push_ring(interior.coords().copied());
        }
    }

    fn end_feature(&mut self) {
        self.feature_ends.push(self.ring_ends.len());
    }

    fn finish(self) -> Result<PolygonSet<T>> {
        let feature_boundaries = to_offsets(BoundaryKind::Feature, self.feature_ends)?;
        let ring_boundaries = to_offsets(BoundaryKind::Ring, self.ring_ends)?;
        PolygonSet::new(feature_boundaries, ring_boundaries, self.x, self.y)
    }
}

fn to_offsets(kind: BoundaryKind, ends: Vec<usize>) -> Result<Vec<u32>> {
    let count = ends.last().copied().unwrap_or(0);
    ends.into_iter()
        .map(|end| u32::try_from(end).map_err(|_| PipError::OffsetOverflow { kind, count }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: x0, y: y0 },
            coord! { x: x0, y: y0 + size },
            coord! { x: x0 + size, y: y0 + size },
            coord! { x: x0 + size, y: y0 },
            coord! { x: x0, y: y0 },
        ]
    }

    #[test]
    fn test_new_accepts_flat_layout() {
        let set = PolygonSet::new(
            vec![1, 2],
            vec![3, 6],
            vec![0.0, 1.0, 0.0, 5.0, 6.0, 5.0],
            vec![0.0, 0.0, 1.0, 5.0, 5.0, 6.0],
        )
        .unwrap();

        assert_eq!(set.num_features(), 2);
        assert_eq!(set.num_rings(), 2);
        assert_eq!(set.num_vertices(), 6);
        assert_eq!(set.ring_range(0), 0..1);
        assert_eq!(set.ring_range(1), 1..2);
        assert_eq!(set.vertex_range(0), 0..3);
        assert_eq!(set.vertex_range(1), 3..6);
    }

    #[test]
    fn test_new_rejects_coordinate_mismatch() {
        let err = PolygonSet::new(vec![1], vec![2], vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert_eq!(err, PipError::CoordinateLengthMismatch { x: 2, y: 1 });
    }

    #[test]
    fn test_new_rejects_too_many_features() {
        let features: Vec<u32> = (0..33).collect();
        let rings: Vec<u32> = (1..33).collect();
        let x = vec![0.0f32; 32];
        let y = vec![0.0f32; 32];
        let err = PolygonSet::new(features, rings, x, y).unwrap_err();
        assert_eq!(err, PipError::TooManyFeatures { count: 33, max: 32 });
    }

    #[test]
    fn test_new_accepts_exactly_max_features() {
        let features: Vec<u32> = (1..=32).collect();
        let rings: Vec<u32> = (1..=32).collect();
        let set = PolygonSet::new(features, rings, vec![0.0f64; 32], vec![0.0f64; 32]).unwrap();
        assert_eq!(set.num_features(), MAX_FEATURES);
    }

    #[test]
    fn test_new_rejects_decreasing_boundaries() {
        let err =
            PolygonSet::new(vec![2, 1], vec![1, 2], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            PipError::DecreasingBoundary {
                kind: BoundaryKind::Feature,
                index: 1,
                value: 1,
                previous: 2,
            }
        );
    }

    #[test]
    fn test_new_rejects_unowned_vertices() {
        let err = PolygonSet::new(vec![1], vec![2], vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0])
            .unwrap_err();
        assert_eq!(
            err,
            PipError::BoundaryMismatch {
                kind: BoundaryKind::Ring,
                last: 2,
                expected: 3,
            }
        );
    }

    #[test]
    fn test_new_rejects_decreasing_ring_boundaries() {
        let err = PolygonSet::new(
            vec![2],
            vec![3, 2],
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PipError::DecreasingBoundary {
                kind: BoundaryKind::Ring,
                index: 1,
                value: 2,
                previous: 3,
            }
        );
    }

    #[test]
    fn test_new_rejects_unowned_rings() {
        let err = PolygonSet::new(
            vec![1],
            vec![2, 4],
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0, 3.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PipError::BoundaryMismatch {
                kind: BoundaryKind::Feature,
                last: 1,
                expected: 2,
            }
        );
    }

    #[test]
    fn test_new_rejects_children_without_boundaries() {
        let err = PolygonSet::new(vec![], vec![2], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            PipError::BoundaryMismatch {
                kind: BoundaryKind::Feature,
                last: 0,
                expected: 1,
            }
        );
    }

    #[test]
    fn test_empty_dataset() {
        let set = PolygonSet::<f64>::new(vec![], vec![], vec![], vec![]).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.num_vertices(), 0);
    }

    #[test]
    fn test_from_features_keeps_rings_as_given() {
        let open = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
        ];
        let set = PolygonSet::from_features(&[vec![open.clone()], vec![square(5.0, 5.0, 1.0)]])
            .unwrap();

        assert_eq!(set.feature_boundaries(), &[1, 2]);
        assert_eq!(set.ring_boundaries(), &[3, 8]);
        assert_eq!(set.feature_rings(0), vec![open]);
    }

    #[test]
    fn test_from_polygons_orders_exterior_then_interiors() {
        let outer = polygon![
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 10.0, y: 0.0),
                (x: 10.0, y: 10.0),
                (x: 0.0, y: 10.0),
            ],
            interiors: [
                [
                    (x: 4.0, y: 4.0),
                    (x: 6.0, y: 4.0),
                    (x: 6.0, y: 6.0),
                    (x: 4.0, y: 6.0),
                ],
            ],
        ];
        let set = PolygonSet::from_polygons(&[outer]).unwrap();

        assert_eq!(set.num_features(), 1);
        assert_eq!(set.ring_range(0), 0..2);
        // geo closes both rings
        assert_eq!(set.ring_boundaries(), &[5, 10]);
        assert_eq!(set.x()[0], set.x()[4]);
    }

    #[test]
    fn test_from_multi_polygons_merges_members() {
        let a = Polygon::new(LineString::new(square(0.0, 0.0, 1.0)), vec![]);
        let b = Polygon::new(LineString::new(square(5.0, 5.0, 1.0)), vec![]);
        let c = Polygon::new(LineString::new(square(9.0, 9.0, 1.0)), vec![]);
        let set = PolygonSet::from_multi_polygons(&[
            MultiPolygon::new(vec![a, b]),
            MultiPolygon::new(vec![c]),
        ])
        .unwrap();

        assert_eq!(set.feature_boundaries(), &[2, 3]);
        assert_eq!(set.num_vertices(), 15);
    }

    #[test]
    fn test_from_features_rejects_too_many_features() {
        let features = vec![vec![square(0.0, 0.0, 1.0)]; MAX_FEATURES + 1];
        let err = PolygonSet::from_features(&features).unwrap_err();
        assert_eq!(err, PipError::TooManyFeatures { count: 33, max: 32 });
    }

    #[test]
    fn test_to_multi_polygon_groups_holes() {
        let set = PolygonSet::from_features(&[vec![
            square(0.0, 0.0, 10.0),
            square(4.0, 4.0, 2.0),
            square(20.0, 20.0, 5.0),
        ]])
        .unwrap();

        let multi = set.to_multi_polygon(0);
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[1].interiors().is_empty());
    }

    #[test]
    fn test_to_multi_polygon_keeps_island_inside_hole() {
        use geo::{Contains, Point};

        let set = PolygonSet::from_features(&[vec![
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
        ]])
        .unwrap();

        let multi = set.to_multi_polygon(0);
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 1);
        assert!(multi.0[1].interiors().is_empty());

        for (x, y) in [(1.0, 1.0), (3.0, 3.0), (5.0, 5.0), (11.0, 5.0)] {
            assert_eq!(
                multi.contains(&Point::new(x, y)),
                set.contains(coord! { x: x, y: y }, 0),
                "membership differs at ({}, {})",
                x,
                y
            );
        }
    }

    #[test]
    fn test_to_multi_polygon_hole_after_island() {
        use geo::{Contains, Point};

        // second hole of the outer ring listed after the island
        let set = PolygonSet::from_features(&[vec![
            square(0.0, 0.0, 20.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
            square(12.0, 12.0, 4.0),
        ]])
        .unwrap();

        let multi = set.to_multi_polygon(0);
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.0[0].interiors().len(), 2);

        for (x, y) in [(1.0, 1.0), (3.0, 3.0), (5.0, 5.0), (14.0, 14.0), (18.0, 18.0)] {
            assert_eq!(
                multi.contains(&Point::new(x, y)),
                set.contains(coord! { x: x, y: y }, 0),
                "membership differs at ({}, {})",
                x,
                y
            );
        }
    }

    #[test]
    fn test_contains_matches_geometry() {
        let set = PolygonSet::from_features(&[vec![square(0.0, 0.0, 10.0)]]).unwrap();
        assert!(set.contains(coord! { x: 5.0, y: 5.0 }, 0));
        assert!(!set.contains(coord! { x: 15.0, y: 5.0 }, 0));
    }

    #[test]
    fn test_serde_roundtrip_and_validation() {
        let set = PolygonSet::from_features(&[vec![square(0.0, 0.0, 10.0)]]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        let back: PolygonSet<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);

        let bad = r#"{"feature_boundaries":[1],"ring_boundaries":[3],"x":[0.0,1.0],"y":[0.0,1.0]}"#;
        assert!(serde_json::from_str::<PolygonSet<f64>>(bad).is_err());
    }

    #[test]
    fn test_into_parts_roundtrip() {
        let set = PolygonSet::from_features(&[vec![square(1.0, 2.0, 3.0)]]).unwrap();
        let parts = set.clone().into_parts();
        assert_eq!(PolygonSet::try_from(parts).unwrap(), set);
    }
}
