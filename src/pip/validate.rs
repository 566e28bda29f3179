//! Comparison of candidate masks against reference masks.

use serde::Serialize;

use super::polygons::{FeatureMask, MAX_FEATURES};
use crate::error::{PipError, Result};

/// A point whose candidate mask differs from the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaskMismatch {
    pub index: usize,
    pub expected: FeatureMask,
    pub actual: FeatureMask,
}

impl MaskMismatch {
    /// Feature indices whose membership bit disagrees.
    pub fn differing_features(&self) -> impl Iterator<Item = usize> {
        let diff = self.expected ^ self.actual;
        (0..MAX_FEATURES).filter(move |&bit| diff & (1 << bit) != 0)
    }
}

/// Outcome of comparing two mask sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub points: usize,
    pub mismatched_points: usize,
    /// First mismatches in index order, capped by the caller's limit.
    pub mismatches: Vec<MaskMismatch>,
}

impl ValidationReport {
    pub fn is_match(&self) -> bool {
        self.mismatched_points == 0
    }
}

pub fn validate_masks(
    reference: &[FeatureMask],
    candidate: &[FeatureMask],
    max_reported: usize,
) -> Result<ValidationReport> {
    if reference.len() != candidate.len() {
        return Err(PipError::MaskLengthMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }

    let mut mismatched_points = 0;
    let mut mismatches = Vec::new();

    for (index, (&expected, &actual)) in reference.iter().zip(candidate).enumerate() {
        if expected == actual {
            continue;
        }
        mismatched_points += 1;
        if mismatches.len() < max_reported {
            mismatches.push(MaskMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(ValidationReport {
        points: reference.len(),
        mismatched_points,
        mismatches,
    })
}
