//! navlog - ingestion core for navigation-estimator sensor logs.
//!
//! Decodes line-oriented logs produced by a navigation/estimation pipeline
//! (IMU, odometry, camera and GNSS observations interleaved with estimator
//! state and covariance) into strongly-typed records, and serves the
//! accumulated records to a visualization layer incrementally and by time
//! window.
//!
//! ## Module Structure
//!
//! - [`record`] - record data model, quantity schema and line decoder
//! - [`store`] - append-only record store with renderer projections
//! - [`ingest`] - background ingestion pipeline (`Log` + reader thread)
//! - [`playback`] - time-windowed cursors for record and image playback
//! - [`settings`] - user settings persistence

pub mod ingest;
pub mod playback;
pub mod record;
pub mod settings;
pub mod store;

pub use ingest::Log;
pub use record::{DecodeError, Delimiter, Record, SensorType};
pub use store::RecordStore;
