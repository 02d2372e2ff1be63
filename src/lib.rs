//! Wellness Insights - On-device analytics engine for sleep and engagement logs
//!
//! Wellness Insights turns stored sleep, workout and engagement rows into
//! derived insights through a deterministic pipeline: row validation →
//! windowing → factor and schedule analysis → tips → payload encoding.
//!
//! ## Modules
//!
//! - **Sleep analytics**: factor impacts, workout correlation, best schedule, tips
//! - **Daily engagement**: weighted daily score and medication timing guidance
//! - **Reports**: period comparisons and body-weight trend projection

pub mod config;
pub mod correlations;
pub mod encoder;
pub mod error;
pub mod factors;
pub mod medication;
pub mod pipeline;
pub mod reminder;
pub mod reports;
pub mod schedule;
pub mod schema;
pub mod score;
pub mod stats;
pub mod tips;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{InsightsConfig, StoredSettings};
pub use error::InsightsError;
pub use pipeline::{sleep_rows_to_insights, InsightsProcessor};
pub use reminder::{MedicationReminderService, NotificationSender, PushNotification};

// Schema exports
pub use schema::{RowAdapter, SleepLogRow, ValidationError, WorkoutLogRow, SCHEMA_VERSION};

/// Library version embedded in all insights payloads
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for insights payloads
pub const PRODUCER_NAME: &str = "wellness-insights";
