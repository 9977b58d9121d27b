//! OCR provider seam
//!
//! The recognition core only needs `(text, corners)` pairs per image. Talking to
//! an actual OCR service lives behind [`OcrProvider`]; the bundled
//! [`JsonDetectionProvider`] replays detections recorded to disk.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use super::error::ProviderError;

/// One raw OCR detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Recognized text
    #[serde(default)]
    pub text: String,
    /// `x1, y1, ..., x4, y4`, clockwise from top-left
    #[serde(default, deserialize_with = "lenient_corners")]
    pub corners: Vec<f64>,
}

/// Accept any JSON for `corners` so one bad detection cannot reject the file.
/// Non-numeric entries become NaN and anything but an array becomes empty;
/// the item repository then skips the detection as malformed.
fn lenient_corners<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let corners = match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .iter()
            .map(|value| value.as_f64().unwrap_or(f64::NAN))
            .collect(),
        _ => Vec::new(),
    };
    Ok(corners)
}

/// Source of detections for an image
pub trait OcrProvider {
    /// Return the detections for `image`, or the provider's failure
    fn detect(&self, image: &Path) -> Result<Vec<RawDetection>, ProviderError>;
}

/// Recorded provider output: either the detections or an explicit failure
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordedOutput {
    Detections(Vec<RawDetection>),
    Failure { status: String, reason: Option<String> },
}

/// Reads previously recorded detections from JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDetectionProvider;

impl JsonDetectionProvider {
    pub fn new() -> Self {
        Self
    }

    /// Parse recorded provider output
    pub fn parse(path: &Path, content: &str) -> Result<Vec<RawDetection>, ProviderError> {
        let output: RecordedOutput =
            serde_json::from_str(content).map_err(|source| ProviderError::Format {
                path: path.to_path_buf(),
                source,
            })?;

        match output {
            RecordedOutput::Detections(detections) => Ok(detections),
            RecordedOutput::Failure { status, reason } => Err(ProviderError::Failed {
                reason: reason.unwrap_or(status),
            }),
        }
    }
}

impl OcrProvider for JsonDetectionProvider {
    fn detect(&self, image: &Path) -> Result<Vec<RawDetection>, ProviderError> {
        let content = std::fs::read_to_string(image).map_err(|source| ProviderError::Io {
            path: image.to_path_buf(),
            source,
        })?;

        let detections = Self::parse(image, &content)?;
        debug!("Loaded {} detections from {:?}", detections.len(), image);
        Ok(detections)
    }
}
