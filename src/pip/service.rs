//! Oracle service tying a dataset to its evaluation settings.

use geo::{Coord, CoordFloat};
use tracing::{debug, info, warn};

use super::parallel::par_point_masks_with_min_len;
use super::polygons::{FeatureMask, PolygonSet};
use super::sequential::point_masks;
use super::validate::{validate_masks, ValidationReport};
use crate::config::OracleConfig;
use crate::error::Result;

/// Reference point-in-polygon evaluator for one dataset
pub struct PipOracle<T> {
    polygons: PolygonSet<T>,
    config: OracleConfig,
}

impl<T> PipOracle<T>
where
    T: CoordFloat + Send + Sync,
{
    pub fn new(polygons: PolygonSet<T>, config: OracleConfig) -> Self {
        info!(
            "PIP oracle over {} features, {} rings, {} vertices",
            polygons.num_features(),
            polygons.num_rings(),
            polygons.num_vertices()
        );
        Self { polygons, config }
    }

    /// Whether `point` lies inside `feature`
    pub fn contains(&self, point: Coord<T>, feature: usize) -> bool {
        self.polygons.contains(point, feature)
    }

    /// Reference masks, one per point in input order
    pub fn masks(&self, points: &[Coord<T>]) -> Vec<FeatureMask> {
        if self.config.parallel && points.len() >= self.config.min_parallel_points {
            debug!("Computing {} masks in parallel", points.len());
            par_point_masks_with_min_len(points, &self.polygons, self.config.min_parallel_points)
        } else {
            debug!("Computing {} masks sequentially", points.len());
            point_masks(points, &self.polygons)
        }
    }

    /// Check masks produced elsewhere against the reference for `points`
    pub fn validate(
        &self,
        points: &[Coord<T>],
        candidate: &[FeatureMask],
    ) -> Result<ValidationReport> {
        let reference = self.masks(points);
        let report = validate_masks(&reference, candidate, self.config.max_reported_mismatches)?;

        if report.is_match() {
            info!("All {} masks match the reference", report.points);
        } else {
            warn!(
                "{} of {} masks differ from the reference",
                report.mismatched_points, report.points
            );
            for mismatch in &report.mismatches {
                debug!(
                    "Point {}: expected {:#034b}, got {:#034b}",
                    mismatch.index, mismatch.expected, mismatch.actual
                );
            }
        }

        Ok(report)
    }

    pub fn polygons(&self) -> &PolygonSet<T> {
        &self.polygons
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }
}
