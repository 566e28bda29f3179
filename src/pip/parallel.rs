//! Rayon-backed batch testing.
//!
//! Points are independent of each other and the dataset is read-only, so the
//! per-point kernel is mapped over an indexed parallel iterator and collected
//! back in input order.

use geo::{Coord, CoordFloat};
use rayon::prelude::*;

use super::polygons::{FeatureMask, PolygonSet};
use super::sequential::point_mask;

/// Parallel equivalent of [`super::point_masks`].
pub fn par_point_masks<T>(points: &[Coord<T>], polygons: &PolygonSet<T>) -> Vec<FeatureMask>
where
    T: CoordFloat + Send + Sync,
{
    par_point_masks_with_min_len(points, polygons, 1)
}

/// Like [`par_point_masks`], with each rayon job handling at least `min_len`
/// points.
pub fn par_point_masks_with_min_len<T>(
    points: &[Coord<T>],
    polygons: &PolygonSet<T>,
    min_len: usize,
) -> Vec<FeatureMask>
where
    T: CoordFloat + Send + Sync,
{
    points
        .par_iter()
        .with_min_len(min_len.max(1))
        .map(|&point| point_mask(point, polygons))
        .collect()
}
