//! Pipcheck - reference point-in-polygon masks for validating accelerated pipelines
//!
//! This library tests points against a polygon dataset stored in flat
//! feature/ring/vertex offset form and compares candidate masks against the result.

pub mod config;
pub mod error;
pub mod pip;

pub use config::OracleConfig;
pub use error::{PipError, Result};
pub use pip::{point_in_feature, point_masks, FeatureMask, PipOracle, PolygonSet, MAX_FEATURES};
