use std::path::PathBuf;

use thiserror::Error;

use crate::BackendKind;

/// Which flattened matrix of a training set an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Input,
    Output,
}

impl std::fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixKind::Input => f.write_str("input"),
            MatrixKind::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid size: {0}")]
    InvalidSize(String),

    #[error(
        "{matrix} index ({sample_index}, {neuron_index}) out of range for {num_samples}x{width} matrix"
    )]
    IndexOutOfRange {
        matrix: MatrixKind,
        sample_index: usize,
        neuron_index: usize,
        num_samples: usize,
        width: usize,
    },

    #[error("dimension mismatch for {what}: got {got}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backend mismatch: expected {expected}, found {found}")]
    BackendMismatch {
        expected: BackendKind,
        found: BackendKind,
    },

    #[error("invalid model data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dimension(what: &'static str, got: usize, expected: usize) -> Self {
        Error::DimensionMismatch {
            what,
            got,
            expected,
        }
    }
}
