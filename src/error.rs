use std::sync::Arc;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Synchronous rejection of malformed requests and parameters.
///
/// Raised before any computation starts; values are never silently
/// coerced into range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("smoothing span must be at least 1, got {span}")]
    SpanOutOfRange { span: i64 },

    #[error("regression fraction must be in (0, 1], got {fraction}")]
    FractionOutOfRange { fraction: f64 },

    #[error("cadence of {minutes} minutes does not divide a day")]
    CadenceNotDivisor { minutes: u32 },

    #[error("target cadence {target_minutes}m is finer than native cadence {native_minutes}m")]
    CadenceMismatch {
        native_minutes: u32,
        target_minutes: u32,
    },

    #[error("range start {start} is not aligned to the {minutes}m cadence")]
    UnalignedRange { start: String, minutes: u32 },

    #[error("range is empty or inverted: {start} >= {end}")]
    EmptyRange { start: String, end: String },

    #[error("query references no entities")]
    EmptyEntitySet,

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("reference year must be 365 or 366 days, got {0}")]
    ReferenceYearOutOfRange(u32),

    #[error("unit scale must be positive and finite, got {0}")]
    UnitScaleOutOfRange(f64),

    #[error("series timestamps must be strictly increasing: {previous} then {current}")]
    NonMonotonicSeries { previous: String, current: String },

    #[error("series cadences differ: {left}m vs {right}m")]
    SeriesCadenceMismatch { left: u32, right: u32 },

    #[error("series lengths differ: {left} vs {right}")]
    SeriesLengthMismatch { left: usize, right: usize },
}

/// Archive collaborator failures during backfill.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("archive returned status {status} for {source} on {day}")]
    Status {
        source: String,
        day: chrono::NaiveDate,
        status: u16,
    },

    #[error("archive payload malformed: {0}")]
    Payload(String),

    #[error("archive fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Violations of raw-store integrity invariants.
///
/// A conflicting duplicate is fatal for that entity's write path and is
/// surfaced for operator resolution rather than auto-resolved.
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error(
        "conflicting duplicate for {entity} at {observed_at} ({cadence_minutes}m): \
         stored {stored}, incoming {incoming}"
    )]
    ConflictingDuplicate {
        entity: String,
        observed_at: String,
        cadence_minutes: u32,
        stored: f64,
        incoming: f64,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Failure of a shared in-flight cache computation, delivered to every
    /// caller that was awaiting the same query key.
    #[error("cached computation failed: {0}")]
    CacheCompute(Arc<Error>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
