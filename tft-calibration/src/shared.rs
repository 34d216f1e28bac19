//! The single "current" calibration matrix shared by display-mapping code
//!
//! Recalibration swaps a whole new [`Matrix`] in. Readers copy the matrix
//! out under the lock, so a transform never sees a half-written matrix.

use log::info;
use std::sync::{Arc, PoisonError, RwLock};

use crate::matrix::Matrix;
use crate::point::Point;

/// Cloneable handle to the current calibration matrix
#[derive(Clone, Debug, Default)]
pub struct SharedMatrix {
    inner: Arc<RwLock<Matrix>>,
}

impl SharedMatrix {
    pub fn new(matrix: Matrix) -> Self {
        Self {
            inner: Arc::new(RwLock::new(matrix)),
        }
    }

    /// Copy of the current matrix
    pub fn snapshot(&self) -> Matrix {
        // Matrix is Copy and always valid, so a poisoned lock still holds
        // a usable value
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a new matrix, returning the one it replaced
    pub fn replace(&self, matrix: Matrix) -> Matrix {
        let mut current = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, matrix);
        info!("Calibration matrix replaced: {}", matrix);
        previous
    }

    /// Map a raw point through the current matrix
    pub fn transform(&self, raw: Point) -> Point {
        self.snapshot().transform(raw)
    }
}

impl From<Matrix> for SharedMatrix {
    fn from(matrix: Matrix) -> Self {
        Self::new(matrix)
    }
}
