//! Affine calibration from (raw, reference) sample pairs
//!
//! Three-point calibration solves the affine system exactly with Cramer's
//! rule. All cross products are evaluated in `i128` so that no 32-bit raw
//! range can overflow before the divider check.
//!
//! N-point calibration (typically five targets) solves the least-squares
//! normal equations the same way and quantizes the solution onto a
//! power-of-two divider.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::matrix::{div_round, Matrix, MatrixFields};
use crate::point::Point;

/// Number of sample pairs consumed by [`compute_matrix`]
pub const THREE_POINT_SAMPLES: usize = 3;

/// Largest fixed-point shift tried by [`fit_matrix`]
const MAX_FIT_SHIFT: u32 = 16;

/// A raw panel reading and the display position it should map to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub raw: Point,
    pub reference: Point,
}

impl CalibrationSample {
    pub const fn new(raw: Point, reference: Point) -> Self {
        Self { raw, reference }
    }
}

/// Derive the calibration matrix from exactly three sample pairs
///
/// # Errors
/// * `InvalidSampleCount` - `samples.len() != 3`
/// * `DegenerateCalibration` - the raw points are collinear or coincident
/// * `CoefficientOverflow` - a term does not fit `i32` even after reducing
///   all seven by their common divisor
pub fn compute_matrix(samples: &[CalibrationSample]) -> Result<Matrix, CalibrationError> {
    let [s0, s1, s2] = match samples {
        [a, b, c] => [*a, *b, *c],
        _ => {
            return Err(CalibrationError::InvalidSampleCount {
                expected: THREE_POINT_SAMPLES,
                actual: samples.len(),
            })
        }
    };

    let (x0, y0) = (s0.raw.x as i128, s0.raw.y as i128);
    let (x1, y1) = (s1.raw.x as i128, s1.raw.y as i128);
    let (x2, y2) = (s2.raw.x as i128, s2.raw.y as i128);

    let divider = (x0 - x2) * (y1 - y2) - (x1 - x2) * (y0 - y2);
    if divider == 0 {
        warn!(
            "Degenerate calibration: raw points {}, {}, {} are collinear",
            s0.raw, s1.raw, s2.raw
        );
        return Err(CalibrationError::DegenerateCalibration);
    }

    // Numerators for one display axis, given that axis' reference values
    let axis = |t0: i128, t1: i128, t2: i128| -> (i128, i128, i128) {
        let a = (t0 - t2) * (y1 - y2) - (t1 - t2) * (y0 - y2);
        let b = (x0 - x2) * (t1 - t2) - (t0 - t2) * (x1 - x2);
        let c = y0 * (x2 * t1 - x1 * t2) + y1 * (x0 * t2 - x2 * t0) + y2 * (x1 * t0 - x0 * t1);
        (a, b, c)
    };

    let (an, bn, cn) = axis(
        s0.reference.x as i128,
        s1.reference.x as i128,
        s2.reference.x as i128,
    );
    let (dn, en, fn_) = axis(
        s0.reference.y as i128,
        s1.reference.y as i128,
        s2.reference.y as i128,
    );

    let terms = narrow_terms([an, bn, cn, dn, en, fn_, divider])?;
    let matrix = matrix_from_terms(terms)?;

    debug!("Three-point calibration: {}", matrix);
    Ok(matrix)
}

/// Least-squares calibration from three or more sample pairs
///
/// With exactly three non-collinear samples this reproduces the
/// [`compute_matrix`] mapping up to fixed-point quantization. The divider of
/// the result is `2^k` for the largest `k <= 16` that keeps every numerator
/// within `i32`.
pub fn fit_matrix(samples: &[CalibrationSample]) -> Result<Matrix, CalibrationError> {
    if samples.len() < THREE_POINT_SAMPLES {
        return Err(CalibrationError::InvalidSampleCount {
            expected: THREE_POINT_SAMPLES,
            actual: samples.len(),
        });
    }

    // Shift raw coordinates so the first sample sits at the origin. This is
    // exact and keeps the normal-matrix sums small for real panel ranges.
    let origin = samples[0].raw;
    let (ox, oy) = (origin.x as i128, origin.y as i128);

    let mut sums = NormalSums::default();
    for sample in samples {
        sums.add(
            sample.raw.x as i128 - ox,
            sample.raw.y as i128 - oy,
            sample.reference.x as i128,
            sample.reference.y as i128,
        )
        .ok_or(CalibrationError::CoefficientOverflow)?;
    }

    let normal = [
        [sums.xx, sums.xy, sums.x],
        [sums.xy, sums.yy, sums.y],
        [sums.x, sums.y, sums.n],
    ];
    let det = det3(&normal).ok_or(CalibrationError::CoefficientOverflow)?;
    if det == 0 {
        warn!("Degenerate calibration: {} raw points are collinear", samples.len());
        return Err(CalibrationError::DegenerateCalibration);
    }

    let solve_axis = |rhs: [i128; 3]| -> Option<[i128; 3]> {
        let a = det3(&replace_column(&normal, 0, rhs))?;
        let b = det3(&replace_column(&normal, 1, rhs))?;
        let c_shifted = det3(&replace_column(&normal, 2, rhs))?;
        // Undo the origin shift: c = c' - a*ox - b*oy
        let c = c_shifted
            .checked_sub(a.checked_mul(ox)?)?
            .checked_sub(b.checked_mul(oy)?)?;
        Some([a, b, c])
    };

    let [an, bn, cn] = solve_axis([sums.tx_x, sums.tx_y, sums.tx])
        .ok_or(CalibrationError::CoefficientOverflow)?;
    let [dn, en, fn_] = solve_axis([sums.ty_x, sums.ty_y, sums.ty])
        .ok_or(CalibrationError::CoefficientOverflow)?;
    let numerators = [an, bn, cn, dn, en, fn_];

    for shift in (0..=MAX_FIT_SHIFT).rev() {
        let scale = 1i128 << shift;
        let Some(quantized) = quantize(&numerators, scale, det) else {
            continue;
        };

        let [an, bn, cn, dn, en, fn_] = quantized;
        let matrix = matrix_from_terms([an, bn, cn, dn, en, fn_, scale as i32])?;
        debug!(
            "Least-squares calibration over {} samples (shift {}): {}",
            samples.len(),
            shift,
            matrix
        );
        return Ok(matrix);
    }

    Err(CalibrationError::CoefficientOverflow)
}

/// Per-sample error `transform(raw) - reference`
pub fn residuals<'a>(
    matrix: &'a Matrix,
    samples: &'a [CalibrationSample],
) -> impl Iterator<Item = Point> + 'a {
    samples.iter().map(move |sample| {
        let mapped = matrix.transform(sample.raw);
        Point::new(
            mapped.x.saturating_sub(sample.reference.x),
            mapped.y.saturating_sub(sample.reference.y),
        )
    })
}

/// Largest Chebyshev distance between a mapped raw point and its reference
pub fn max_error(matrix: &Matrix, samples: &[CalibrationSample]) -> u32 {
    samples
        .iter()
        .map(|sample| matrix.transform(sample.raw).chebyshev_distance(sample.reference))
        .max()
        .unwrap_or(0)
}

/// Running sums for the least-squares normal equations
#[derive(Default)]
struct NormalSums {
    n: i128,
    x: i128,
    y: i128,
    xx: i128,
    xy: i128,
    yy: i128,
    tx: i128,
    tx_x: i128,
    tx_y: i128,
    ty: i128,
    ty_x: i128,
    ty_y: i128,
}

impl NormalSums {
    fn add(&mut self, x: i128, y: i128, tx: i128, ty: i128) -> Option<()> {
        self.n += 1;
        self.x = self.x.checked_add(x)?;
        self.y = self.y.checked_add(y)?;
        self.xx = self.xx.checked_add(x.checked_mul(x)?)?;
        self.xy = self.xy.checked_add(x.checked_mul(y)?)?;
        self.yy = self.yy.checked_add(y.checked_mul(y)?)?;
        self.tx = self.tx.checked_add(tx)?;
        self.tx_x = self.tx_x.checked_add(tx.checked_mul(x)?)?;
        self.tx_y = self.tx_y.checked_add(tx.checked_mul(y)?)?;
        self.ty = self.ty.checked_add(ty)?;
        self.ty_x = self.ty_x.checked_add(ty.checked_mul(x)?)?;
        self.ty_y = self.ty_y.checked_add(ty.checked_mul(y)?)?;
        Some(())
    }
}

fn det3(m: &[[i128; 3]; 3]) -> Option<i128> {
    let minor = |a: i128, b: i128, c: i128, d: i128| -> Option<i128> {
        a.checked_mul(d)?.checked_sub(b.checked_mul(c)?)
    };

    let t0 = m[0][0].checked_mul(minor(m[1][1], m[1][2], m[2][1], m[2][2])?)?;
    let t1 = m[0][1].checked_mul(minor(m[1][0], m[1][2], m[2][0], m[2][2])?)?;
    let t2 = m[0][2].checked_mul(minor(m[1][0], m[1][1], m[2][0], m[2][1])?)?;

    t0.checked_sub(t1)?.checked_add(t2)
}

fn replace_column(m: &[[i128; 3]; 3], column: usize, values: [i128; 3]) -> [[i128; 3]; 3] {
    let mut out = *m;
    for (row, value) in out.iter_mut().zip(values) {
        row[column] = value;
    }
    out
}

/// Scale numerators onto `scale` as the new divider, `None` if any term
/// overflows while scaling or leaves the `i32` range
fn quantize(numerators: &[i128; 6], scale: i128, det: i128) -> Option<[i32; 6]> {
    let mut out = [0i32; 6];
    for (slot, &numerator) in out.iter_mut().zip(numerators) {
        let scaled = div_round(numerator.checked_mul(scale)?, det);
        *slot = i32::try_from(scaled).ok()?;
    }
    Some(out)
}

/// Fit seven exact terms into `i32`, reducing by their common divisor if
/// that is what it takes
fn narrow_terms(terms: [i128; 7]) -> Result<[i32; 7], CalibrationError> {
    if let Some(narrowed) = try_narrow(&terms) {
        return Ok(narrowed);
    }

    let divisor = terms.iter().fold(0u128, |acc, t| gcd(acc, t.unsigned_abs()));
    // divider != 0 so divisor >= 1
    let reduced = terms.map(|t| t / divisor as i128);

    match try_narrow(&reduced) {
        Some(narrowed) => {
            warn!("Calibration terms reduced by common divisor {}", divisor);
            Ok(narrowed)
        }
        None => Err(CalibrationError::CoefficientOverflow),
    }
}

fn try_narrow(terms: &[i128; 7]) -> Option<[i32; 7]> {
    let mut out = [0i32; 7];
    for (slot, &term) in out.iter_mut().zip(terms) {
        *slot = i32::try_from(term).ok()?;
    }
    Some(out)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn matrix_from_terms(terms: [i32; 7]) -> Result<Matrix, CalibrationError> {
    let [an, bn, cn, dn, en, fn_, divider] = terms;
    Matrix::from_fields(MatrixFields { an, bn, cn, dn, en, fn_, divider })
        .ok_or(CalibrationError::DegenerateCalibration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rx: i32, ry: i32, x: i32, y: i32) -> CalibrationSample {
        CalibrationSample::new(Point::new(rx, ry), Point::new(x, y))
    }

    fn swap_scale_offset() -> [CalibrationSample; 3] {
        [
            sample(0, 0, 100, 100),
            sample(100, 0, 100, 300),
            sample(0, 100, 300, 100),
        ]
    }

    #[test]
    fn test_axis_swap_scale_offset() {
        let m = compute_matrix(&swap_scale_offset()).unwrap();

        assert_eq!(m.to_array(), [0, 20000, 1_000_000, 20000, 0, 1_000_000, 10000]);
        // X = 100 + 2 * raw_y, Y = 100 + 2 * raw_x
        assert_eq!(m.transform(Point::new(50, 50)), Point::new(200, 200));
        assert_eq!(m.transform(Point::new(10, 70)), Point::new(240, 120));
    }

    #[test]
    fn test_non_collinear_gives_nonzero_divider() {
        let cases = [
            [sample(0, 0, 0, 0), sample(1, 0, 5, 5), sample(0, 1, 9, 2)],
            [sample(200, 300, 20, 20), sample(3800, 350, 300, 20), sample(2000, 3700, 160, 220)],
            [sample(-50, 10, 0, 0), sample(40, -90, 10, 10), sample(7, 7, -3, 4)],
        ];

        for samples in cases {
            let m = compute_matrix(&samples).unwrap();
            assert_ne!(m.divider(), 0);
        }
    }

    #[test]
    fn test_collinear_is_degenerate() {
        let collinear = [sample(0, 0, 10, 10), sample(10, 10, 20, 20), sample(20, 20, 30, 40)];
        assert_eq!(
            compute_matrix(&collinear),
            Err(CalibrationError::DegenerateCalibration)
        );

        let duplicate = [sample(5, 5, 10, 10), sample(5, 5, 20, 20), sample(100, 7, 30, 40)];
        assert_eq!(
            compute_matrix(&duplicate),
            Err(CalibrationError::DegenerateCalibration)
        );

        let coincident = [sample(3, 3, 0, 0), sample(3, 3, 1, 0), sample(3, 3, 0, 1)];
        assert_eq!(
            compute_matrix(&coincident),
            Err(CalibrationError::DegenerateCalibration)
        );
    }

    #[test]
    fn test_identity_samples() {
        let samples = [sample(12, 40, 12, 40), sample(900, 55, 900, 55), sample(300, 700, 300, 700)];
        let m = compute_matrix(&samples).unwrap();

        for p in [
            Point::new(0, 0),
            Point::new(-17, 3),
            Point::new(4095, 4095),
            Point::new(1234, -987),
        ] {
            assert_eq!(m.transform(p), p);
        }
    }

    #[test]
    fn test_scale_and_translate() {
        let (k, dx, dy) = (3, -20, 45);
        let map = |x: i32, y: i32| sample(x, y, k * x + dx, k * y + dy);
        let m = compute_matrix(&[map(10, 10), map(500, 40), map(60, 800)]).unwrap();

        for p in [Point::new(0, 0), Point::new(333, 121), Point::new(-40, 999)] {
            let q = m.transform(p);
            assert!((q.x - (k * p.x + dx)).abs() <= 1, "{} -> {}", p, q);
            assert!((q.y - (k * p.y + dy)).abs() <= 1, "{} -> {}", p, q);
        }
    }

    #[test]
    fn test_sample_count_guard() {
        let three = swap_scale_offset();

        assert_eq!(
            compute_matrix(&three[..2]),
            Err(CalibrationError::InvalidSampleCount { expected: 3, actual: 2 })
        );

        let four = [three[0], three[1], three[2], sample(50, 50, 200, 200)];
        assert_eq!(
            compute_matrix(&four),
            Err(CalibrationError::InvalidSampleCount { expected: 3, actual: 4 })
        );

        assert_eq!(
            compute_matrix(&[]),
            Err(CalibrationError::InvalidSampleCount { expected: 3, actual: 0 })
        );
    }

    #[test]
    fn test_large_terms_reduced_by_common_divisor() {
        const H: i32 = 1 << 30;
        // Identity over a huge raw range: divider is 2^62 before reduction
        let samples = [sample(-H, -H, -H, -H), sample(H, -H, H, -H), sample(-H, H, -H, H)];
        let m = compute_matrix(&samples).unwrap();

        assert_eq!(m.to_array(), [1, 0, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_irreducible_overflow() {
        const H: i32 = 1 << 30;
        // Needs a divider of 2^31, which does not fit i32
        let samples = [sample(-H, -H, 0, 0), sample(H, -H, 1, 0), sample(-H, H, 0, 1)];
        assert_eq!(
            compute_matrix(&samples),
            Err(CalibrationError::CoefficientOverflow)
        );
    }

    #[test]
    fn test_fit_exact_mapping() {
        // X = 100 + 2 * raw_y, Y = 100 + 2 * raw_x
        let map = |x: i32, y: i32| sample(x, y, 100 + 2 * y, 100 + 2 * x);
        let samples = [map(0, 0), map(100, 0), map(0, 100), map(100, 100), map(50, 50)];
        let m = fit_matrix(&samples).unwrap();

        assert_eq!(m.divider(), 1 << 16);
        assert_eq!(max_error(&m, &samples), 0);
        assert_eq!(m.transform(Point::new(50, 50)), Point::new(200, 200));
        assert_eq!(m.transform(Point::new(10, 70)), Point::new(240, 120));
    }

    #[test]
    fn test_fit_averages_symmetric_noise() {
        // X = x / 10, Y = y / 10 with +-1 noise on X that cancels out
        let samples = [
            sample(0, 0, 1, 0),
            sample(1000, 0, 99, 0),
            sample(0, 1000, -1, 100),
            sample(1000, 1000, 101, 100),
            sample(500, 500, 50, 50),
        ];
        let m = fit_matrix(&samples).unwrap();

        assert_eq!(max_error(&m, &samples), 1);
        assert_eq!(m.transform(Point::new(200, 700)), Point::new(20, 70));
        assert_eq!(m.transform(Point::new(1000, 1000)), Point::new(100, 100));
    }

    #[test]
    fn test_fit_with_offset_origin() {
        // Typical resistive panel: raw 200..3800 onto 320x240
        let samples = [
            sample(200, 200, 0, 0),
            sample(3800, 200, 320, 0),
            sample(200, 3800, 0, 240),
            sample(3800, 3800, 320, 240),
            sample(2000, 2000, 160, 120),
        ];
        let m = fit_matrix(&samples).unwrap();

        assert!(max_error(&m, &samples) <= 1);
        assert_eq!(m.transform(Point::new(2000, 2000)), Point::new(160, 120));
    }

    #[test]
    fn test_fit_matches_three_point() {
        let samples = swap_scale_offset();
        let exact = compute_matrix(&samples).unwrap();
        let fitted = fit_matrix(&samples).unwrap();

        for p in [Point::new(0, 0), Point::new(37, 81), Point::new(250, -30)] {
            assert_eq!(exact.transform(p), fitted.transform(p));
        }
    }

    #[test]
    fn test_fit_guards() {
        let samples = swap_scale_offset();
        assert_eq!(
            fit_matrix(&samples[..2]),
            Err(CalibrationError::InvalidSampleCount { expected: 3, actual: 2 })
        );

        let collinear = [
            sample(0, 0, 0, 0),
            sample(10, 20, 1, 1),
            sample(20, 40, 2, 2),
            sample(30, 60, 3, 3),
        ];
        assert_eq!(
            fit_matrix(&collinear),
            Err(CalibrationError::DegenerateCalibration)
        );
    }

    #[test]
    fn test_quantize_overflow_falls_through() {
        let numerator = i128::MAX / 2;
        let det = i128::MAX / 4;

        // Scaling by 2^16 overflows i128, a shift of zero does not
        assert_eq!(quantize(&[numerator; 6], 1 << MAX_FIT_SHIFT, det), None);
        assert_eq!(quantize(&[numerator; 6], 1, det), Some([2; 6]));

        // Rounds without overflowing, then fails the i32 range check
        assert_eq!(quantize(&[i128::MAX - 1; 6], 1, 1 << 20), None);
    }

    #[test]
    fn test_residuals() {
        let m = compute_matrix(&swap_scale_offset()).unwrap();
        let measured = [sample(50, 50, 199, 203), sample(0, 0, 100, 100)];

        let errors: Vec<Point> = residuals(&m, &measured).collect();
        assert_eq!(errors, vec![Point::new(1, -3), Point::new(0, 0)]);
        assert_eq!(max_error(&m, &measured), 3);
        assert_eq!(max_error(&m, &[]), 0);
    }
}
