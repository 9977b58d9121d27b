//! Spatial bucketing of text items
//!
//! Anchors are snapped to a grid so that items which belong to the same
//! row or column end up sharing a bucket despite OCR jitter.

use std::collections::BTreeMap;

use super::classify::{TextItem, TextKind};

/// Fallback cell size when there is nothing to measure
const DEFAULT_CELL_SIZE: f64 = 1.0;

/// Snap `value` to the nearest multiple of `cell_size`.
///
/// Exact ties round to the even multiple.
pub fn bucket(value: f64, cell_size: f64) -> f64 {
    cell_size * bucket_index(value, cell_size) as f64
}

/// Index of the grid cell containing `value`
pub fn bucket_index(value: f64, cell_size: f64) -> i64 {
    (value / cell_size).round_ties_even() as i64
}

/// Cell sizes derived from the items themselves.
///
/// Width is half the mean name box width (names in the same column start
/// within a fraction of a name of each other). Height is the mean line height
/// of all items.
pub fn suggest_cell_sizes(items: &[TextItem]) -> (f64, f64) {
    let mean = |values: Vec<f64>| {
        let positive: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
        if positive.is_empty() {
            DEFAULT_CELL_SIZE
        } else {
            positive.iter().sum::<f64>() / positive.len() as f64
        }
    };

    let widths = items
        .iter()
        .filter(|item| item.kind == TextKind::Name)
        .map(|item| item.bounding_box.width() / 2.0)
        .collect();
    let heights = items.iter().map(|item| item.bounding_box.height()).collect();

    (mean(widths), mean(heights))
}

/// Items in one x-bucket, keyed by y-bucket
pub type GridColumn<'a> = BTreeMap<i64, Vec<&'a TextItem>>;

/// Two-level bucket map: x-bucket -> y-bucket -> items in insertion order.
///
/// Built in a single pass and never modified afterwards.
#[derive(Debug, Clone)]
pub struct HistogramGrid<'a> {
    cell_size_x: f64,
    cell_size_y: f64,
    columns: BTreeMap<i64, GridColumn<'a>>,
}

impl<'a> HistogramGrid<'a> {
    /// Group items by the grid cell of their anchor
    pub fn build<I>(items: I, cell_size_x: f64, cell_size_y: f64) -> Self
    where
        I: IntoIterator<Item = &'a TextItem>,
    {
        let mut columns: BTreeMap<i64, GridColumn<'a>> = BTreeMap::new();

        for item in items {
            let x = bucket_index(item.anchor.x, cell_size_x);
            let y = bucket_index(item.anchor.y, cell_size_y);
            columns.entry(x).or_default().entry(y).or_default().push(item);
        }

        Self {
            cell_size_x,
            cell_size_y,
            columns,
        }
    }

    /// X-buckets left to right
    pub fn columns(&self) -> impl Iterator<Item = (i64, &GridColumn<'a>)> {
        self.columns.iter().map(|(x, column)| (*x, column))
    }

    pub fn column(&self, x: i64) -> Option<&GridColumn<'a>> {
        self.columns.get(&x)
    }

    /// Items in a single cell
    pub fn cell(&self, x: i64, y: i64) -> &[&'a TextItem] {
        self.columns
            .get(&x)
            .and_then(|column| column.get(&y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pixel coordinate of an x-bucket
    pub fn x_position(&self, x: i64) -> f64 {
        x as f64 * self.cell_size_x
    }

    /// Pixel coordinate of a y-bucket
    pub fn y_position(&self, y: i64) -> f64 {
        y as f64 * self.cell_size_y
    }

    pub fn cell_sizes(&self) -> (f64, f64) {
        (self.cell_size_x, self.cell_size_y)
    }
}
