//! # TFT Touchscreen Calibration
//!
//! Integer-only affine calibration for resistive touch panels:
//! - **Calibrate**: derive a [`Matrix`] from three (raw, reference) sample
//!   pairs, or least-squares fit one from more
//! - **Transform**: map raw panel readings to display coordinates with
//!   round-to-nearest integer arithmetic
//! - **Storage**: persist the matrix as seven little-endian `i32` fields
//! - **Touch**: turn raw samples into calibrated Down/Move/Up events
//!
//! # Usage
//!
//! ```
//! use tft_calibration::{compute_matrix, CalibrationSample, Point};
//!
//! let samples = [
//!     CalibrationSample::new(Point::new(0, 0), Point::new(100, 100)),
//!     CalibrationSample::new(Point::new(100, 0), Point::new(100, 300)),
//!     CalibrationSample::new(Point::new(0, 100), Point::new(300, 100)),
//! ];
//!
//! let matrix = compute_matrix(&samples).unwrap();
//! assert_eq!(matrix.transform(Point::new(50, 50)), Point::new(200, 200));
//! ```

pub mod calibrate;
pub mod error;
pub mod matrix;
pub mod point;
pub mod profile;
pub mod shared;
pub mod storage;
pub mod touch;

pub use calibrate::{compute_matrix, fit_matrix, max_error, residuals, CalibrationSample};
pub use error::{CalibrationError, StorageError};
pub use matrix::Matrix;
pub use point::Point;
pub use profile::{get_profile, profile_names, PanelProfile};
pub use shared::SharedMatrix;
pub use touch::{CalibratedTouch, RawSample, RawTouchSource, TouchEvent, TouchPoint};
