//! Record model and line decoder for navigation-estimator logs.
//!
//! Every log line is a sensor-type tag followed by a fixed run of numeric
//! columns: the sensor's input block, the ground-truth quantity, the
//! error-state quantity and the error-state covariance. [`Record::decode`]
//! turns one tokenized line into exactly one record or fails; no partially
//! populated record is ever produced.

pub mod schema;

use serde::{Deserialize, Serialize};
use strum::FromRepr;
use thiserror::Error;

pub use schema::{
    CameraField, CameraInput, Covariance, ImuField, ImuInput, OdomField, OdomInput, Quantity,
    QuantityField,
};

/// Why a line failed to decode. All variants are per-line and non-fatal to
/// an ingestion run; the line is skipped and reading continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token list was empty.
    #[error("empty line")]
    EmptyLine,

    /// The leading token was not one of the known sensor-type tags.
    #[error("unknown sensor type tag `{0}`")]
    UnknownSensorType(String),

    /// A block (or the whole line) had the wrong number of columns.
    #[error("expected {expected} columns, got {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    /// A column was not a valid floating-point literal.
    #[error("invalid numeric token `{token}`")]
    NumericParseError {
        token: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// The closed set of sensor sources a line can come from. The discriminant
/// is the integer tag carried as the first token of every line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromRepr)]
#[repr(usize)]
pub enum SensorType {
    Imu = 0,
    Odom = 1,
    Camera = 2,
    Gnss = 3,
}

impl SensorType {
    /// Width of this sensor's input-data block.
    pub fn input_cols(&self) -> usize {
        match self {
            SensorType::Imu => ImuInput::COLS,
            SensorType::Odom => OdomInput::COLS,
            // GNSS lines carry the camera layout under their own tag
            SensorType::Camera | SensorType::Gnss => CameraInput::COLS,
        }
    }

    /// Total column count of a line of this type, excluding the leading tag.
    pub fn total_cols(&self) -> usize {
        self.input_cols() + 2 * Quantity::COLS + Covariance::COLS
    }

    pub fn name(&self) -> &'static str {
        match self {
            SensorType::Imu => "IMU",
            SensorType::Odom => "Odom",
            SensorType::Camera => "Camera",
            SensorType::Gnss => "GNSS",
        }
    }
}

/// Token separator used by the deployed log producer. Space-separated logs
/// skip runs of whitespace; comma-separated logs split on every comma.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Space,
    Comma,
}

impl Delimiter {
    /// Split one line into tokens.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Space => line.split_whitespace().collect(),
            Delimiter::Comma => line.split(',').collect(),
        }
    }

    /// Separator used when re-emitting a record as a line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Space => " ",
            Delimiter::Comma => ",",
        }
    }
}

macro_rules! record_struct {
    ($(#[$doc:meta])* $name:ident, $input:ty) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            pub input: $input,
            pub real: Quantity,
            pub state: Quantity,
            pub covariance: Covariance,
        }
    };
}

record_struct!(
    /// One decoded IMU line.
    ImuRecord,
    ImuInput
);
record_struct!(
    /// One decoded wheel-odometry line.
    OdomRecord,
    OdomInput
);
record_struct!(
    /// One decoded camera line.
    CameraRecord,
    CameraInput
);
record_struct!(
    /// One decoded GNSS line (camera input layout, GNSS tag).
    GnssRecord,
    CameraInput
);

/// One decoded log line: sensor input data plus the ground-truth and
/// error-state quantities and the error-state covariance.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Imu(ImuRecord),
    Odom(OdomRecord),
    Camera(CameraRecord),
    Gnss(GnssRecord),
}

impl Record {
    /// Decode one line's tokens into a record.
    ///
    /// The first token must be a known integer sensor tag and the remaining
    /// token count must equal the tag's total column count exactly. Blocks
    /// are parsed in fixed order (input, real, state, covariance); any
    /// failure discards the whole record. Pure function of the token list,
    /// safe to call concurrently.
    pub fn decode(toks: &[&str]) -> Result<Record, DecodeError> {
        let (tag, rest) = toks.split_first().ok_or(DecodeError::EmptyLine)?;

        let sensor = tag
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(SensorType::from_repr)
            .ok_or_else(|| DecodeError::UnknownSensorType(tag.to_string()))?;

        let expected = sensor.total_cols();
        if rest.len() != expected {
            return Err(DecodeError::ColumnCountMismatch {
                expected,
                actual: rest.len(),
            });
        }

        let (input_toks, rest) = rest.split_at(sensor.input_cols());
        let (real_toks, rest) = rest.split_at(Quantity::COLS);
        let (state_toks, cov_toks) = rest.split_at(Quantity::COLS);

        let real = Quantity::parse(real_toks)?;
        let state = Quantity::parse(state_toks)?;
        let covariance = Covariance::parse(cov_toks)?;

        Ok(match sensor {
            SensorType::Imu => Record::Imu(ImuRecord {
                input: ImuInput::parse(input_toks)?,
                real,
                state,
                covariance,
            }),
            SensorType::Odom => Record::Odom(OdomRecord {
                input: OdomInput::parse(input_toks)?,
                real,
                state,
                covariance,
            }),
            SensorType::Camera => Record::Camera(CameraRecord {
                input: CameraInput::parse(input_toks)?,
                real,
                state,
                covariance,
            }),
            SensorType::Gnss => Record::Gnss(GnssRecord {
                input: CameraInput::parse(input_toks)?,
                real,
                state,
                covariance,
            }),
        })
    }

    /// Tokenize `line` with `delimiter` and decode it.
    pub fn decode_line(line: &str, delimiter: Delimiter) -> Result<Record, DecodeError> {
        Self::decode(&delimiter.split(line))
    }

    pub fn sensor_type(&self) -> SensorType {
        match self {
            Record::Imu(_) => SensorType::Imu,
            Record::Odom(_) => SensorType::Odom,
            Record::Camera(_) => SensorType::Camera,
            Record::Gnss(_) => SensorType::Gnss,
        }
    }

    /// Timestamp of the ground-truth quantity. This is the timeline the
    /// store's windowed playback runs on.
    pub fn time(&self) -> f64 {
        self.real().time()
    }

    /// Timestamp of the sensor input block.
    pub fn input_time(&self) -> f64 {
        match self {
            Record::Imu(r) => r.input.time(),
            Record::Odom(r) => r.input.time(),
            Record::Camera(r) => r.input.time(),
            Record::Gnss(r) => r.input.time(),
        }
    }

    pub fn real(&self) -> &Quantity {
        match self {
            Record::Imu(r) => &r.real,
            Record::Odom(r) => &r.real,
            Record::Camera(r) => &r.real,
            Record::Gnss(r) => &r.real,
        }
    }

    pub fn state(&self) -> &Quantity {
        match self {
            Record::Imu(r) => &r.state,
            Record::Odom(r) => &r.state,
            Record::Camera(r) => &r.state,
            Record::Gnss(r) => &r.state,
        }
    }

    pub fn covariance(&self) -> &Covariance {
        match self {
            Record::Imu(r) => &r.covariance,
            Record::Odom(r) => &r.covariance,
            Record::Camera(r) => &r.covariance,
            Record::Gnss(r) => &r.covariance,
        }
    }

    fn input_values(&self) -> &[f64] {
        match self {
            Record::Imu(r) => r.input.values(),
            Record::Odom(r) => r.input.values(),
            Record::Camera(r) => r.input.values(),
            Record::Gnss(r) => r.input.values(),
        }
    }

    /// Re-emit this record as the token sequence it decoded from: the tag
    /// followed by all blocks in line order. `decode(to_tokens())`
    /// round-trips field for field.
    pub fn to_tokens(&self) -> Vec<String> {
        let sensor = self.sensor_type();
        let mut toks = Vec::with_capacity(1 + sensor.total_cols());
        toks.push((sensor as usize).to_string());
        for block in [
            self.input_values(),
            self.real().values(),
            self.state().values(),
            self.covariance().values(),
        ] {
            toks.extend(block.iter().map(|v| v.to_string()));
        }
        toks
    }

    /// Format this record as one log line.
    pub fn encode(&self, delimiter: Delimiter) -> String {
        self.to_tokens().join(delimiter.as_str())
    }
}

/// Build a decoded record for unit tests: all columns zero except the
/// real-quantity timestamp.
#[cfg(test)]
pub(crate) fn sample_record(sensor: SensorType, time: f64) -> Record {
    let zeros = |n: usize| std::iter::repeat("0".to_string()).take(n);
    let mut toks = vec![(sensor as usize).to_string()];
    toks.extend(zeros(sensor.input_cols()));
    toks.push(time.to_string());
    toks.extend(zeros(Quantity::COLS - 1));
    toks.extend(zeros(Quantity::COLS));
    toks.extend(zeros(Covariance::COLS));
    let refs: Vec<&str> = toks.iter().map(String::as_str).collect();
    Record::decode(&refs).expect("sample record must decode")
}
