//! Affine calibration matrix
//!
//! Six numerators sharing one divider:
//!
//! ```text
//! x' = (An * x + Bn * y + Cn) / Divider
//! y' = (Dn * x + En * y + Fn) / Divider
//! ```
//!
//! The divider is never zero. Every constructor checks it, so
//! [`Matrix::transform`] has no error path.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Integer affine transform from raw panel space to display space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MatrixFields", into = "MatrixFields")]
pub struct Matrix {
    an: i32,
    bn: i32,
    cn: i32,
    dn: i32,
    en: i32,
    fn_: i32,
    divider: i32,
}

/// Unchecked field layout, in storage order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixFields {
    pub an: i32,
    pub bn: i32,
    pub cn: i32,
    pub dn: i32,
    pub en: i32,
    #[serde(rename = "fn")]
    pub fn_: i32,
    pub divider: i32,
}

impl Matrix {
    /// Matrix that maps every point to itself
    pub const IDENTITY: Matrix = Matrix {
        an: 1,
        bn: 0,
        cn: 0,
        dn: 0,
        en: 1,
        fn_: 0,
        divider: 1,
    };

    /// Build a matrix from its seven fields, rejecting a zero divider
    pub fn from_fields(fields: MatrixFields) -> Option<Self> {
        if fields.divider == 0 {
            return None;
        }

        Some(Self {
            an: fields.an,
            bn: fields.bn,
            cn: fields.cn,
            dn: fields.dn,
            en: fields.en,
            fn_: fields.fn_,
            divider: fields.divider,
        })
    }

    /// Fields in storage order `(An, Bn, Cn, Dn, En, Fn, Divider)`
    pub fn fields(&self) -> MatrixFields {
        MatrixFields {
            an: self.an,
            bn: self.bn,
            cn: self.cn,
            dn: self.dn,
            en: self.en,
            fn_: self.fn_,
            divider: self.divider,
        }
    }

    pub fn to_array(&self) -> [i32; 7] {
        [
            self.an,
            self.bn,
            self.cn,
            self.dn,
            self.en,
            self.fn_,
            self.divider,
        ]
    }

    pub fn divider(&self) -> i32 {
        self.divider
    }

    /// Map a raw panel point to display coordinates
    ///
    /// Products and sums are evaluated in `i128`, then divided with
    /// round-to-nearest (ties away from zero). Results outside the `i32`
    /// range saturate.
    pub fn transform(&self, raw: Point) -> Point {
        let x = raw.x as i128;
        let y = raw.y as i128;
        let divider = self.divider as i128;

        let num_x = self.an as i128 * x + self.bn as i128 * y + self.cn as i128;
        let num_y = self.dn as i128 * x + self.en as i128 * y + self.fn_ as i128;

        Point {
            x: saturate(div_round(num_x, divider)),
            y: saturate(div_round(num_y, divider)),
        }
    }
}

impl TryFrom<MatrixFields> for Matrix {
    type Error = &'static str;

    fn try_from(fields: MatrixFields) -> Result<Self, Self::Error> {
        Matrix::from_fields(fields).ok_or("matrix divider must be non-zero")
    }
}

impl From<Matrix> for MatrixFields {
    fn from(matrix: Matrix) -> Self {
        matrix.fields()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x' = ({} * x + {} * y + {}) / {}, y' = ({} * x + {} * y + {}) / {}",
            self.an, self.bn, self.cn, self.divider, self.dn, self.en, self.fn_, self.divider
        )
    }
}

/// Integer division rounding to nearest, ties away from zero
///
/// `den` must be non-zero; either sign is accepted. Never overflows: the
/// remainder is compared against what is left of the divisor instead of
/// adding half of it to the numerator.
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    let quotient = num.saturating_div(den);
    let remainder = num.checked_rem(den).unwrap_or(0).unsigned_abs();

    if remainder >= den.unsigned_abs() - remainder {
        if (num < 0) != (den < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

fn saturate(value: i128) -> i32 {
    value.clamp(i32::MIN as i128, i32::MAX as i128) as i32
}
