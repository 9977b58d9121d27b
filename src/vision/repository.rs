//! Item repository
//!
//! Turns raw provider detections into classified text items for one parse.
//! Malformed detections are skipped and counted rather than failing the parse.

use serde::Serialize;
use tracing::{debug, warn};

use super::classify::{TextClassifier, TextItem, TextKind};
use super::error::DetectionError;
use super::geometry::BoundingBox;
use super::provider::RawDetection;

/// Per-parse detection statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    /// Detections received from the provider
    pub total: usize,
    /// Detections skipped as malformed
    pub skipped: usize,
    pub numerals: usize,
    pub names: usize,
    pub mixed: usize,
    pub neither: usize,
}

impl DetectionSummary {
    fn record(&mut self, kind: TextKind) {
        match kind {
            TextKind::Numeral => self.numerals += 1,
            TextKind::Name => self.names += 1,
            TextKind::Mixed => self.mixed += 1,
            TextKind::Neither => self.neither += 1,
        }
    }
}

/// Classified items of a single parse, in provider order
#[derive(Debug, Clone, Default)]
pub struct ItemRepository {
    items: Vec<TextItem>,
    errors: Vec<DetectionError>,
    summary: DetectionSummary,
}

impl ItemRepository {
    /// Classify every detection, skipping the malformed ones
    pub fn from_detections(classifier: &TextClassifier, detections: &[RawDetection]) -> Self {
        let mut repo = Self::default();
        repo.summary.total = detections.len();

        for (index, detection) in detections.iter().enumerate() {
            match parse_box(index, &detection.corners) {
                Ok(bbox) => {
                    let item = classifier.classify(index, &detection.text, bbox);
                    repo.summary.record(item.kind);
                    repo.items.push(item);
                }
                Err(e) => {
                    warn!("Skipping detection: {}", e);
                    repo.summary.skipped += 1;
                    repo.errors.push(e);
                }
            }
        }

        debug!(
            "Classified {} detections ({} names, {} numerals, {} mixed, {} neither, {} skipped)",
            repo.summary.total,
            repo.summary.names,
            repo.summary.numerals,
            repo.summary.mixed,
            repo.summary.neither,
            repo.summary.skipped
        );

        repo
    }

    /// All classified items
    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    /// Errors for the skipped detections
    pub fn errors(&self) -> &[DetectionError] {
        &self.errors
    }

    pub fn summary(&self) -> &DetectionSummary {
        &self.summary
    }
}

fn parse_box(index: usize, corners: &[f64]) -> Result<BoundingBox, DetectionError> {
    if corners.iter().take(8).any(|v| !v.is_finite()) {
        return Err(DetectionError::Malformed {
            index,
            reason: "non-finite coordinate".to_string(),
        });
    }

    BoundingBox::from_coords(corners).ok_or_else(|| DetectionError::Malformed {
        index,
        reason: format!("expected 8 coordinates, got {}", corners.len()),
    })
}
