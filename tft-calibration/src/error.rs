//! Error types for calibration and matrix storage

use thiserror::Error;

/// Failure to derive a calibration matrix from sample pairs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Wrong number of (raw, reference) sample pairs
    #[error("invalid sample count: expected {expected}, got {actual}")]
    InvalidSampleCount { expected: usize, actual: usize },

    /// Raw points are collinear or coincident, so the divider is zero
    #[error("degenerate calibration: raw sample points are collinear or coincident")]
    DegenerateCalibration,

    /// Matrix terms cannot be represented as 32-bit integers
    #[error("calibration coefficients do not fit in 32-bit integers")]
    CoefficientOverflow,
}

/// Failure to read or write a stored calibration matrix
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("calibration file is {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },

    #[error("not a calibration file (bad magic {0:02x?})")]
    BadMagic([u8; 4]),

    #[error("unsupported calibration file version {0}")]
    UnsupportedVersion(u16),

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Stored record has a zero divider and cannot be applied
    #[error("stored matrix has a zero divider")]
    ZeroDivider,
}
