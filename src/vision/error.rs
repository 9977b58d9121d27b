//! Error types for scoreboard reconstruction

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// A single detection that could not be turned into a text item
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Corner data is missing or corrupt
    #[error("malformed detection #{index}: {reason}")]
    Malformed { index: usize, reason: String },
}

/// Column- and table-level reconstruction failures
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// No window of `window` name candidates satisfied the alignment test
    #[error("no aligned name column of at least {window} items among {candidates} candidates")]
    NoColumnFound { window: usize, candidates: usize },

    /// Full reconstruction found a stat column count other than the configured one
    #[error("expected {expected} stat columns, found {found}")]
    AmbiguousColumnCount { expected: usize, found: usize },
}

/// Failures reported by an OCR provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read detections from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid detection data in {path}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The provider explicitly reported a failure or timeout for this image
    #[error("OCR provider failed: {reason}")]
    Failed { reason: String },
}

/// Rejected configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_column_size must be at least 1")]
    ZeroWindow,

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}
