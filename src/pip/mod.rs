//! Point-in-Polygon (PIP) reference tester.
//!
//! Ray-casts points against a flat polygon dataset and packs per-feature
//! membership into one mask per point, for checking accelerated results.

mod parallel;
mod polygons;
mod sequential;
mod service;
mod validate;

pub use parallel::{par_point_masks, par_point_masks_with_min_len};
pub use polygons::{FeatureMask, PolygonSet, PolygonSetParts, MAX_FEATURES};
pub use sequential::{point_in_feature, point_mask, point_masks};
pub use service::PipOracle;
pub use validate::{validate_masks, MaskMismatch, ValidationReport};
