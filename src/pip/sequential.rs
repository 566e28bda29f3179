//! Sequential even-odd ray casting.
//!
//! This is the reference the accelerated pipeline is checked against, so the
//! comparisons below are exact and must not pick up tolerances.

use geo::{Coord, CoordFloat};

use super::polygons::{FeatureMask, PolygonSet, MAX_FEATURES};

/// Whether a horizontal ray from `(x, y)` towards +x crosses the edges of one
/// ring an odd number of times.
///
/// Edges join consecutive stored vertices only; the last vertex is not joined
/// back to the first. An edge counts when `y` falls in the half-open span
/// between its endpoint heights, so a vertex shared by two edges is counted
/// once and horizontal edges never count.
pub(crate) fn ring_parity<T: CoordFloat>(x: T, y: T, xs: &[T], ys: &[T]) -> bool {
    let mut odd = false;
    for (xw, yw) in xs.windows(2).zip(ys.windows(2)) {
        let (x0, x1) = (xw[0], xw[1]);
        let (y0, y1) = (yw[0], yw[1]);
        if ((y0 <= y && y < y1) || (y1 <= y && y < y0))
            && x < (x1 - x0) * (y - y0) / (y1 - y0) + x0
        {
            odd = !odd;
        }
    }
    odd
}

/// Test a single point against a single feature.
///
/// Every ring of the feature toggles the same flag, so nested rings act as
/// holes regardless of their orientation.
///
/// `feature` must be below `polygons.num_features()`.
pub fn point_in_feature<T: CoordFloat>(
    x: T,
    y: T,
    polygons: &PolygonSet<T>,
    feature: usize,
) -> bool {
    debug_assert!(
        feature < polygons.num_features(),
        "feature {} out of range for {} features",
        feature,
        polygons.num_features()
    );

    let mut inside = false;
    for ring in polygons.ring_range(feature) {
        let vertices = polygons.vertex_range(ring);
        inside ^= ring_parity(
            x,
            y,
            &polygons.x()[vertices.clone()],
            &polygons.y()[vertices],
        );
    }
    inside
}

/// Membership of one point across every feature; bit `j` is feature `j`.
pub fn point_mask<T: CoordFloat>(point: Coord<T>, polygons: &PolygonSet<T>) -> FeatureMask {
    debug_assert!(polygons.num_features() <= MAX_FEATURES);

    let mut mask: FeatureMask = 0;
    for feature in 0..polygons.num_features() {
        if point_in_feature(point.x, point.y, polygons, feature) {
            mask |= 1 << feature;
        }
    }
    mask
}

/// One mask per point, in input order.
pub fn point_masks<T: CoordFloat>(
    points: &[Coord<T>],
    polygons: &PolygonSet<T>,
) -> Vec<FeatureMask> {
    points
        .iter()
        .map(|&point| point_mask(point, polygons))
        .collect()
}
