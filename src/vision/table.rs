//! Best-effort full table reconstruction
//!
//! Buckets every item into a grid, labels dense x-buckets as the name column
//! or stat columns by majority kind, and reads each player's stats from the
//! same y-bucket of every stat column. Items that straddle a bucket boundary
//! can land in a neighbouring cell, so rows may come back incomplete.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

use super::classify::{TextItem, TextKind};
use super::column::ScoreboardColumn;
use super::error::ParseError;
use super::histogram::{bucket_index, GridColumn, HistogramGrid};

/// Non-fatal problems with individual rows
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableWarning {
    #[error("row {row} ({name}) is missing {missing:?}")]
    IncompleteRow {
        row: usize,
        name: String,
        missing: Vec<String>,
    },
}

/// One player's row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    /// Row position in pixels
    pub y: f64,
    /// Stat slot -> value; unreadable slots are absent
    pub stats: BTreeMap<String, u32>,
}

/// Reconstructed scoreboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardTable {
    pub rows: Vec<PlayerRecord>,
    pub warnings: Vec<TableWarning>,
}

/// Settings for one table reconstruction
#[derive(Debug, Clone)]
pub struct TableLayout<'c> {
    pub cell_size_x: f64,
    pub cell_size_y: f64,
    /// Minimum column size; a grid column needs more occupied rows than this
    pub min_rows: usize,
    /// Stat slot names, left to right
    pub stat_columns: &'c [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    Name,
    Stat,
}

/// Majority kind of a grid column, if it is dense enough to be a table column
fn column_role(column: &GridColumn, min_rows: usize) -> Option<ColumnRole> {
    if column.len() <= min_rows {
        return None;
    }

    let items: Vec<&TextItem> = column.values().flatten().copied().collect();
    let majority = |kind: TextKind| items.iter().filter(|item| item.kind == kind).count() * 2 > items.len();

    if majority(TextKind::Name) {
        Some(ColumnRole::Name)
    } else if majority(TextKind::Numeral) {
        Some(ColumnRole::Stat)
    } else {
        None
    }
}

/// Read a numeral, treating `O`/`o` as zero
fn numeral_value(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .map(|c| if c == 'O' || c == 'o' { '0' } else { c })
        .collect();
    digits.parse().ok()
}

/// Rows of the table: y-bucket -> player name
fn name_rows<'a>(
    grid: &HistogramGrid<'a>,
    name_columns: &[i64],
    column: &ScoreboardColumn<'a>,
) -> BTreeMap<i64, &'a TextItem> {
    let in_column: HashSet<usize> = column.items().iter().map(|item| item.index).collect();
    let overlap = |x: i64| {
        grid.column(x)
            .map(|cells| {
                cells
                    .values()
                    .flatten()
                    .filter(|item| in_column.contains(&item.index))
                    .count()
            })
            .unwrap_or(0)
    };

    // Most overlap with the detected name column wins, leftmost on ties
    let best = name_columns
        .iter()
        .copied()
        .fold(None, |best: Option<(i64, usize)>, x| {
            let score = overlap(x);
            match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((x, score)),
            }
        });

    let mut rows = BTreeMap::new();
    match best.and_then(|(x, _)| grid.column(x)) {
        Some(cells) => {
            for (&y, items) in cells {
                if let Some(item) = items.iter().find(|item| item.kind == TextKind::Name) {
                    rows.insert(y, *item);
                }
            }
        }
        None => {
            debug!("No dense name column in grid, using detected column rows");
            let (_, cell_y) = grid.cell_sizes();
            // topmost item wins when two share a y-bucket
            for item in column.by_row() {
                let y = bucket_index(item.anchor.y, cell_y);
                rows.entry(y).or_insert(item);
            }
        }
    }
    rows
}

/// Assemble player records from the grid.
///
/// Fails with [`ParseError::AmbiguousColumnCount`] when the number of stat
/// columns differs from the configured slots.
pub fn reconstruct_table<'a>(
    items: &'a [TextItem],
    column: &ScoreboardColumn<'a>,
    layout: &TableLayout,
) -> Result<ScoreboardTable, ParseError> {
    let grid = HistogramGrid::build(items, layout.cell_size_x, layout.cell_size_y);

    let mut name_columns = Vec::new();
    let mut stat_columns = Vec::new();
    for (x, cells) in grid.columns() {
        match column_role(cells, layout.min_rows) {
            Some(ColumnRole::Name) => name_columns.push(x),
            Some(ColumnRole::Stat) => stat_columns.push(x),
            None => {}
        }
    }

    debug!(
        "Grid has {} x-buckets: {} name columns, {} stat columns",
        grid.columns().count(),
        name_columns.len(),
        stat_columns.len()
    );

    if stat_columns.len() != layout.stat_columns.len() {
        return Err(ParseError::AmbiguousColumnCount {
            expected: layout.stat_columns.len(),
            found: stat_columns.len(),
        });
    }

    let rows = name_rows(&grid, &name_columns, column);
    let mut records = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for (row, (&y, name)) in rows.iter().enumerate() {
        let mut stats = BTreeMap::new();
        let mut missing = Vec::new();

        for (slot, &x) in layout.stat_columns.iter().zip(&stat_columns) {
            match grid.cell(x, y).iter().find_map(|item| numeral_value(&item.text)) {
                Some(value) => {
                    stats.insert(slot.clone(), value);
                }
                None => missing.push(slot.clone()),
            }
        }

        if !missing.is_empty() {
            let warning = TableWarning::IncompleteRow {
                row,
                name: name.text.clone(),
                missing,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }

        records.push(PlayerRecord {
            name: name.text.clone(),
            y: grid.y_position(y),
            stats,
        });
    }

    Ok(ScoreboardTable {
        rows: records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnConfig;
    use crate::vision::classify::TextClassifier;
    use crate::vision::column::reconstruct_name_column;
    use crate::vision::geometry::BoundingBox;

    const NAMES: [&str; 8] = [
        "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
    ];

    fn slots() -> Vec<String> {
        ["points", "kills", "assists", "deaths", "ping"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn boxed(x: f64, y: f64, w: f64) -> BoundingBox {
        BoundingBox::from_coords(&[x, y - 8.0, x + w, y - 8.0, x + w, y + 8.0, x, y + 8.0]).unwrap()
    }

    /// Eight rows, name at x=100, stat centers at 300..700
    fn scoreboard(skip: Option<(usize, usize)>) -> Vec<TextItem> {
        let classifier = TextClassifier::new().unwrap();
        let mut items = Vec::new();
        for (row, name) in NAMES.iter().enumerate() {
            let y = 200.0 + 40.0 * row as f64;
            items.push(classifier.classify(items.len(), name, boxed(100.0, y, 80.0)));
            for col in 0..5 {
                if skip == Some((row, col)) {
                    continue;
                }
                let value = format!("{}", (row + 1) * 10 + col);
                let center = 300.0 + 100.0 * col as f64;
                items.push(classifier.classify(items.len(), &value, boxed(center - 10.0, y, 20.0)));
            }
        }
        items
    }

    /// Extra name items, one per scoreboard row, at the given x positions
    fn add_names(items: &mut Vec<TextItem>, label: &str, xs: &[f64]) {
        let classifier = TextClassifier::new().unwrap();
        for (row, &x) in xs.iter().enumerate() {
            let y = 200.0 + 40.0 * row as f64;
            let text = format!("{}{}", label, row);
            items.push(classifier.classify(items.len(), &text, boxed(x, y, 80.0)));
        }
    }

    fn row_names(table: &ScoreboardTable) -> Vec<&str> {
        table.rows.iter().map(|row| row.name.as_str()).collect()
    }

    fn layout(stat_columns: &[String]) -> TableLayout<'_> {
        TableLayout {
            cell_size_x: 40.0,
            cell_size_y: 20.0,
            min_rows: 6,
            stat_columns,
        }
    }

    #[test]
    fn test_full_table() {
        let items = scoreboard(None);
        let column = reconstruct_name_column(&items, &ColumnConfig::default()).unwrap();
        let slots = slots();

        let table = reconstruct_table(&items, &column, &layout(&slots)).unwrap();
        assert_eq!(table.rows.len(), 8);
        assert!(table.warnings.is_empty());

        let first = &table.rows[0];
        assert_eq!(first.name, "Alpha");
        assert_eq!(first.stats["points"], 10);
        assert_eq!(first.stats["ping"], 14);
        assert_eq!(table.rows[6].name, "Golf");
        assert_eq!(table.rows[6].stats["kills"], 71);
    }

    #[test]
    fn test_missing_cell_is_incomplete_row() {
        let items = scoreboard(Some((2, 3)));
        let column = reconstruct_name_column(&items, &ColumnConfig::default()).unwrap();
        let slots = slots();

        let table = reconstruct_table(&items, &column, &layout(&slots)).unwrap();
        assert_eq!(table.rows.len(), 8);
        assert_eq!(
            table.warnings,
            vec![TableWarning::IncompleteRow {
                row: 2,
                name: "Charlie".to_string(),
                missing: vec!["deaths".to_string()],
            }]
        );
        assert!(!table.rows[2].stats.contains_key("deaths"));
        assert_eq!(table.rows[2].stats["ping"], 34);
    }

    #[test]
    fn test_wrong_stat_count_is_ambiguous() {
        let items = scoreboard(None);
        let column = reconstruct_name_column(&items, &ColumnConfig::default()).unwrap();
        let slots: Vec<String> = slots().into_iter().take(4).collect();

        let result = reconstruct_table(&items, &column, &layout(&slots));
        assert_eq!(
            result,
            Err(ParseError::AmbiguousColumnCount {
                expected: 4,
                found: 5
            })
        );
    }

    #[test]
    fn test_name_bucket_holding_detected_column_wins() {
        // Spare names fill x-bucket 1 but are too ragged for a window, so the
        // detected column is the one at x=100 (bucket 2)
        let mut items = scoreboard(None);
        add_names(&mut items, "Spare", &[21.0, 27.0, 33.0, 39.0, 45.0, 51.0, 57.0, 58.0]);
        let column = reconstruct_name_column(&items, &ColumnConfig::default()).unwrap();
        assert_eq!(column.window_start(), 8);
        assert!(column.items().iter().all(|item| item.anchor.x == 100.0));
        let slots = slots();

        let table = reconstruct_table(&items, &column, &layout(&slots)).unwrap();
        assert_eq!(row_names(&table), NAMES.to_vec());
        assert!(table.warnings.is_empty());
        assert_eq!(table.rows[3].stats["assists"], 42);
    }

    #[test]
    fn test_equal_overlap_prefers_leftmost_name_bucket() {
        // A short run at x=10 is the detected column; it shares no items with
        // either dense name bucket
        let mut items = scoreboard(None);
        add_names(&mut items, "Spare", &[40.0; 8]);
        let classifier = TextClassifier::new().unwrap();
        for (i, y) in [100.0, 120.0, 140.0].into_iter().enumerate() {
            let text = format!("Header{}", i);
            items.push(classifier.classify(items.len(), &text, boxed(10.0, y, 80.0)));
        }
        let config = ColumnConfig {
            min_column_size: 3,
            ..ColumnConfig::default()
        };
        let column = reconstruct_name_column(&items, &config).unwrap();
        assert_eq!(column.len(), 3);
        let slots = slots();

        let table = reconstruct_table(&items, &column, &layout(&slots)).unwrap();
        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[0].name, "Spare0");
        assert_eq!(table.rows[7].name, "Spare7");
        assert_eq!(table.rows[7].stats["ping"], 84);
    }

    #[test]
    fn test_no_dense_name_bucket_uses_detected_column() {
        // Names alternate between x=100 (bucket 2) and x=112 (bucket 3), so
        // neither bucket has enough rows to count as a table column
        let classifier = TextClassifier::new().unwrap();
        let mut items = Vec::new();
        for (row, name) in NAMES.iter().enumerate() {
            let y = 200.0 + 40.0 * row as f64;
            let x = if row % 2 == 0 { 100.0 } else { 112.0 };
            items.push(classifier.classify(items.len(), name, boxed(x, y, 80.0)));
            for col in 0..5 {
                let value = format!("{}", (row + 1) * 10 + col);
                let center = 300.0 + 100.0 * col as f64;
                items.push(classifier.classify(items.len(), &value, boxed(center - 10.0, y, 20.0)));
            }
        }
        // Discovered first (smallest x) but sits below Alpha in the same y-bucket
        items.push(classifier.classify(items.len(), "Ghost", boxed(99.0, 203.0, 80.0)));

        let column = reconstruct_name_column(&items, &ColumnConfig::default()).unwrap();
        assert_eq!(column.len(), 9);
        assert_eq!(column.items()[0].text, "Ghost");
        let slots = slots();

        let table = reconstruct_table(&items, &column, &layout(&slots)).unwrap();
        assert_eq!(row_names(&table), NAMES.to_vec());
        assert!(table.warnings.is_empty());
        assert_eq!(table.rows[1].stats["kills"], 21);
    }

    #[test]
    fn test_numeral_value_reads_letter_o() {
        assert_eq!(numeral_value("1O"), Some(10));
        assert_eq!(numeral_value("oo7"), Some(7));
        assert_eq!(numeral_value(""), None);
        assert_eq!(numeral_value("Player"), None);
    }
}
