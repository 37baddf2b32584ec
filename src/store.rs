//! Append-only store for decoded records.
//!
//! Records land here in file line order during ingestion and are only ever
//! read by index afterwards. The store also exposes the numeric projections
//! the renderer consumes: single-field accessors into a record's ground-truth
//! quantity and strided `(time, value)` series.

use thiserror::Error;

use crate::record::{QuantityField, Record};

/// Initial capacity reserved for a fresh store. Logs commonly run to tens or
/// hundreds of thousands of lines; reserving up front avoids reallocation
/// churn during ingestion.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Default decimation stride for plotted series.
pub const DEFAULT_STRIDE: usize = 5;

/// Consumer-side indexing error. The core never clamps a bad index; any
/// clamping belongs to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record index {index} out of range (store has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Append-only ordered sequence of successfully decoded records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append a record, returning its index.
    pub fn append(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<&Record, StoreError> {
        self.records.get(index).ok_or(StoreError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Drop all records. Any cursor tied to this store must be cleared with
    /// it; [`crate::ingest::Log::clear`] does both.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// One field of record `index`'s ground-truth quantity.
    pub fn value(&self, index: usize, field: QuantityField) -> Result<f64, StoreError> {
        Ok(self.at(index)?.real().get(field))
    }

    pub fn time(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::Time)
    }

    pub fn bias_gyro_x(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BgX)
    }

    pub fn bias_gyro_y(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BgY)
    }

    pub fn bias_gyro_z(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BgZ)
    }

    pub fn bias_acc_x(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BaX)
    }

    pub fn bias_acc_y(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BaY)
    }

    pub fn bias_acc_z(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::BaZ)
    }

    pub fn position_x(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::PX)
    }

    pub fn position_y(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::PY)
    }

    pub fn position_z(&self, index: usize) -> Result<f64, StoreError> {
        self.value(index, QuantityField::PZ)
    }

    /// `(time, value)` pairs of one ground-truth field, taking every
    /// `stride`-th record. A stride of 0 is treated as 1.
    pub fn series(&self, field: QuantityField, stride: usize) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .step_by(stride.max(1))
            .map(|r| (r.time(), r.real().get(field)))
            .collect()
    }

    /// `(p_x, p_y)` pairs of the ground-truth trajectory, taking every
    /// `stride`-th record.
    pub fn trajectory(&self, stride: usize) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .step_by(stride.max(1))
            .map(|r| {
                (
                    r.real().get(QuantityField::PX),
                    r.real().get(QuantityField::PY),
                )
            })
            .collect()
    }
}
