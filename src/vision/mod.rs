//! Vision/OCR Layer
//!
//! Rebuilds a scoreboard from OCR detections. Stages run strictly in order:
//! - geometry: points and quadrilateral boxes
//! - classify: clean and classify text, pick anchors
//! - repository: classified items for one parse
//! - histogram: snap anchors to a grid
//! - column / table: find the name column, then the stat columns

pub mod classify;
pub mod column;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod provider;
pub mod repository;
pub mod table;

pub use classify::{TextClassifier, TextItem, TextKind};
pub use column::{reconstruct_name_column, ColumnEntry, ScoreboardColumn};
pub use error::{ConfigError, DetectionError, ParseError, ProviderError};
pub use geometry::{BoundingBox, Point};
pub use histogram::{suggest_cell_sizes, HistogramGrid};
pub use provider::{JsonDetectionProvider, OcrProvider, RawDetection};
pub use repository::{DetectionSummary, ItemRepository};
pub use table::{reconstruct_table, ScoreboardTable, TableLayout};

use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// Outcome of the name column search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ColumnReport {
    Found {
        entries: Vec<ColumnEntry>,
        /// Index of the accepted window among the sorted name candidates
        window_start: usize,
        /// Items added after the window by chained extension
        chained: usize,
    },
    Failed {
        error: ParseError,
    },
}

/// Outcome of the full table reconstruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableReport {
    Built(ScoreboardTable),
    Skipped { error: ParseError },
}

/// Everything learned from one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    /// Where the detections came from
    pub source: String,
    pub summary: DetectionSummary,
    /// Detections skipped as malformed
    pub skipped: Vec<String>,
    pub column: ColumnReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableReport>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// One occupied grid cell, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub x: f64,
    pub y: f64,
    pub texts: Vec<String>,
}

/// Outcome of parsing one input of a batch
#[derive(Debug)]
pub struct BatchResult {
    pub path: PathBuf,
    pub report: Result<ParseReport, ProviderError>,
}

/// Scoreboard reconstruction pipeline.
///
/// Holds only immutable settings, so one parser can serve many threads; every
/// derived structure is rebuilt per call.
#[derive(Debug, Clone)]
pub struct ScoreboardParser {
    classifier: TextClassifier,
    config: AppConfig,
}

impl ScoreboardParser {
    /// Create a parser with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(AppConfig::default())
    }

    /// Create a parser with custom configuration
    pub fn with_config(config: AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let classifier = TextClassifier::new().context("Failed to compile text patterns")?;
        Ok(Self { classifier, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Classify raw detections
    pub fn classify(&self, detections: &[RawDetection]) -> ItemRepository {
        ItemRepository::from_detections(&self.classifier, detections)
    }

    /// Grid cell sizes: configured values, else derived from the items
    pub fn cell_sizes(&self, items: &[TextItem]) -> (f64, f64) {
        let grid = &self.config.grid;
        match (grid.cell_size_x, grid.cell_size_y) {
            (Some(x), Some(y)) => (x, y),
            (x, y) => {
                let (auto_x, auto_y) = suggest_cell_sizes(items);
                (x.unwrap_or(auto_x), y.unwrap_or(auto_y))
            }
        }
    }

    /// Run the full reconstruction on one set of detections
    pub fn parse_detections(&self, source: &str, detections: &[RawDetection]) -> ParseReport {
        let start = Instant::now();
        let repo = self.classify(detections);
        let items = repo.items();

        let (column, table) = match reconstruct_name_column(items, &self.config.column) {
            Ok(found) => {
                let table = self
                    .config
                    .output
                    .full_reconstruction
                    .then(|| self.build_table(items, &found));
                let column = ColumnReport::Found {
                    entries: found.entries(),
                    window_start: found.window_start(),
                    chained: found.extension_len(),
                };
                (column, table)
            }
            Err(error) => {
                warn!("{}: {}", source, error);
                (ColumnReport::Failed { error }, None)
            }
        };

        let processing_time = start.elapsed();
        debug!("Parsed {} in {:?}", source, processing_time);

        ParseReport {
            source: source.to_string(),
            summary: repo.summary().clone(),
            skipped: repo.errors().iter().map(ToString::to_string).collect(),
            column,
            table,
            processing_time_ms: processing_time.as_millis() as u64,
        }
    }

    fn build_table(&self, items: &[TextItem], column: &ScoreboardColumn) -> TableReport {
        let (cell_size_x, cell_size_y) = self.cell_sizes(items);
        debug!("Table grid cell size {:.1}x{:.1}", cell_size_x, cell_size_y);

        let layout = TableLayout {
            cell_size_x,
            cell_size_y,
            min_rows: self.config.column.min_column_size,
            stat_columns: &self.config.grid.stat_columns,
        };

        match reconstruct_table(items, column, &layout) {
            Ok(table) => TableReport::Built(table),
            Err(error) => {
                warn!("Skipping full table reconstruction: {}", error);
                TableReport::Skipped { error }
            }
        }
    }

    /// Fetch detections for `image` from `provider` and parse them
    pub fn parse_with<P>(&self, provider: &P, image: &Path) -> Result<ParseReport, ProviderError>
    where
        P: OcrProvider + ?Sized,
    {
        let detections = provider.detect(image)?;
        info!("Parsing {} detections from {:?}", detections.len(), image);
        Ok(self.parse_detections(&image.display().to_string(), &detections))
    }

    /// Parse several images on a bounded pool of worker threads.
    ///
    /// At most `available_parallelism` workers pull paths from a shared job
    /// queue. Results come back in input order.
    pub fn parse_many<P>(&self, provider: &P, images: &[PathBuf]) -> Vec<BatchResult>
    where
        P: OcrProvider + Sync + ?Sized,
    {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(images.len());
        debug!("Parsing {} inputs on {} workers", images.len(), workers);

        let (job_tx, job_rx) = unbounded::<(usize, &PathBuf)>();
        let (result_tx, result_rx) = unbounded();
        for job in images.iter().enumerate() {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, image) in job_rx {
                        let report = self.parse_with(provider, image);
                        if result_tx.send((index, report)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut results: Vec<(usize, Result<ParseReport, ProviderError>)> = result_rx.iter().collect();
        results.sort_by_key(|(index, _)| *index);

        results
            .into_iter()
            .map(|(index, report)| BatchResult {
                path: images[index].clone(),
                report,
            })
            .collect()
    }

    /// Occupied grid cells over all items, for diagnostics
    pub fn grid_report(&self, repo: &ItemRepository) -> Vec<GridCell> {
        let items = repo.items();
        let (cell_size_x, cell_size_y) = self.cell_sizes(items);
        let grid = HistogramGrid::build(items, cell_size_x, cell_size_y);
        let grid = &grid;

        grid.columns()
            .flat_map(move |(x, cells)| {
                cells.iter().map(move |(&y, items)| GridCell {
                    x: grid.x_position(x),
                    y: grid.y_position(y),
                    texts: items.iter().map(|item| item.text.clone()).collect(),
                })
            })
            .collect()
    }
}
