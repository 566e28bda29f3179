//! Errors raised while building polygon datasets and comparing masks.

use thiserror::Error;

/// Which offset sequence of a polygon dataset an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Feature,
    Ring,
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryKind::Feature => write!(f, "feature"),
            BoundaryKind::Ring => write!(f, "ring"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipError {
    #[error("Vertex coordinate sequences differ in length (x: {x}, y: {y})")]
    CoordinateLengthMismatch { x: usize, y: usize },

    #[error("Dataset has {count} features but a mask holds at most {max}")]
    TooManyFeatures { count: usize, max: usize },

    #[error("{kind} boundary {index} is {value}, below the previous boundary {previous}")]
    DecreasingBoundary {
        kind: BoundaryKind,
        index: usize,
        value: u32,
        previous: u32,
    },

    #[error("Last {kind} boundary is {last} but {expected} children are stored")]
    BoundaryMismatch {
        kind: BoundaryKind,
        last: u32,
        expected: usize,
    },

    #[error("{count} {kind} children do not fit in a 32-bit offset")]
    OffsetOverflow { kind: BoundaryKind, count: usize },

    #[error("Mask sequences differ in length (reference: {reference}, candidate: {candidate})")]
    MaskLengthMismatch { reference: usize, candidate: usize },
}

pub type Result<T> = std::result::Result<T, PipError>;
