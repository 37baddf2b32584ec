//! Fixed-width numeric blocks that make up one log record.
//!
//! A record line is a flat run of floating-point columns: one sensor-specific
//! input block, two 19-column quantity blocks (ground truth and estimator
//! error state) and an 18x18 covariance block. Each block type knows its
//! column count and refuses token slices of any other length.

use std::ops::Index;

use strum::EnumCount;

use super::DecodeError;

/// Column layout of the IMU input block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumCount)]
#[repr(usize)]
pub enum ImuField {
    Time,
    GyroX,
    GyroY,
    GyroZ,
    AccX,
    AccY,
    AccZ,
}

/// Column layout of the wheel-odometry input block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumCount)]
#[repr(usize)]
pub enum OdomField {
    Time,
    VeloX,
    VeloY,
    VeloZ,
}

/// Column layout of the camera input block. GNSS lines share this layout
/// under their own sensor tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumCount)]
#[repr(usize)]
pub enum CameraField {
    Time,
    LocX,
    LocY,
    LocZ,
    PoseX,
    PoseY,
    PoseZ,
}

/// Column layout of a quantity block: position, velocity, rotation, gyro
/// bias, accel bias and gravity, preceded by the timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumCount)]
#[repr(usize)]
pub enum QuantityField {
    Time,
    PX,
    PY,
    PZ,
    VX,
    VY,
    VZ,
    RX,
    RY,
    RZ,
    BgX,
    BgY,
    BgZ,
    BaX,
    BaY,
    BaZ,
    GravX,
    GravY,
    GravZ,
}

/// Side length of the error-state covariance matrix (the 18 non-time
/// dimensions of a quantity block).
pub const COVARIANCE_DIM: usize = QuantityField::COUNT - 1;

/// Parse a token slice into exactly `N` doubles, in token order.
fn parse_values<const N: usize>(toks: &[&str]) -> Result<[f64; N], DecodeError> {
    if toks.len() != N {
        return Err(DecodeError::ColumnCountMismatch {
            expected: N,
            actual: toks.len(),
        });
    }

    let mut values = [0.0; N];
    for (slot, tok) in values.iter_mut().zip(toks) {
        *slot = parse_f64(tok)?;
    }
    Ok(values)
}

/// Parse a single token as an f64. Tokens are plain ASCII float literals
/// ("." decimal point); anything else fails the whole line.
fn parse_f64(tok: &str) -> Result<f64, DecodeError> {
    let tok = tok.trim();
    tok.parse::<f64>().map_err(|source| DecodeError::NumericParseError {
        token: tok.to_string(),
        source,
    })
}

macro_rules! input_block {
    ($(#[$doc:meta])* $name:ident, $field:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name([f64; $field::COUNT]);

        impl $name {
            pub const COLS: usize = $field::COUNT;

            pub fn parse(toks: &[&str]) -> Result<Self, DecodeError> {
                Ok(Self(parse_values(toks)?))
            }

            pub fn values(&self) -> &[f64] {
                &self.0
            }

            /// Timestamp column of this input block.
            pub fn time(&self) -> f64 {
                self.0[0]
            }
        }

        impl Index<$field> for $name {
            type Output = f64;

            fn index(&self, field: $field) -> &f64 {
                &self.0[field as usize]
            }
        }
    };
}

input_block!(
    /// IMU input columns: timestamp, gyro xyz, accel xyz.
    ImuInput,
    ImuField
);
input_block!(
    /// Odometry input columns: timestamp, velocity xyz.
    OdomInput,
    OdomField
);
input_block!(
    /// Camera (and GNSS) input columns: timestamp, location xyz, pose xyz.
    CameraInput,
    CameraField
);

/// One 19-column quantity block. Used twice per record: once for the ground
/// truth ("real quantity") and once for the estimator error state.
#[derive(Clone, Debug, PartialEq)]
pub struct Quantity([f64; QuantityField::COUNT]);

impl Quantity {
    pub const COLS: usize = QuantityField::COUNT;

    pub fn parse(toks: &[&str]) -> Result<Self, DecodeError> {
        Ok(Self(parse_values(toks)?))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, field: QuantityField) -> f64 {
        self.0[field as usize]
    }

    pub fn time(&self) -> f64 {
        self.get(QuantityField::Time)
    }
}

impl Index<QuantityField> for Quantity {
    type Output = f64;

    fn index(&self, field: QuantityField) -> &f64 {
        &self.0[field as usize]
    }
}

/// Row-major 18x18 covariance of the error-state dimensions (TIME excluded).
///
/// Boxed so a `Record` stays cheap to move; the block dominates the record's
/// size at 324 doubles.
#[derive(Clone, Debug, PartialEq)]
pub struct Covariance(Box<[f64; COVARIANCE_DIM * COVARIANCE_DIM]>);

impl Covariance {
    pub const COLS: usize = COVARIANCE_DIM * COVARIANCE_DIM;

    pub fn parse(toks: &[&str]) -> Result<Self, DecodeError> {
        Ok(Self(Box::new(parse_values(toks)?)))
    }

    pub fn values(&self) -> &[f64] {
        self.0.as_slice()
    }

    /// Entry at `(row, col)`. Panics if either index is >= 18, matching
    /// slice indexing semantics.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        assert!(row < COVARIANCE_DIM && col < COVARIANCE_DIM);
        self.0[row * COVARIANCE_DIM + col]
    }

    /// The per-dimension variances, in quantity-block field order
    /// (P, V, R, BG, BA, GRAV).
    pub fn diagonal(&self) -> [f64; COVARIANCE_DIM] {
        let mut diag = [0.0; COVARIANCE_DIM];
        for (i, slot) in diag.iter_mut().enumerate() {
            *slot = self.0[i * COVARIANCE_DIM + i];
        }
        diag
    }
}
