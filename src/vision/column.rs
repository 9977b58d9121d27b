//! Player-name column reconstruction
//!
//! Finds the run of name items that forms one visually aligned column:
//! a fixed-size window checked against its leftmost item, then extended one
//! item at a time with a looser tolerance chained off the last accepted item.

use serde::Serialize;
use tracing::{debug, info};

use super::classify::{TextItem, TextKind};
use super::error::ParseError;
use super::geometry::Point;
use crate::config::ColumnConfig;

/// Name items judged to share one column
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardColumn<'a> {
    items: Vec<&'a TextItem>,
    window_start: usize,
    window_len: usize,
}

impl<'a> ScoreboardColumn<'a> {
    /// Items in discovery order: the accepted window, then chained extensions
    pub fn items(&self) -> &[&'a TextItem] {
        &self.items
    }

    /// Items sorted top to bottom
    pub fn by_row(&self) -> Vec<&'a TextItem> {
        let mut rows = self.items.clone();
        rows.sort_by(|a, b| a.anchor.y.total_cmp(&b.anchor.y).then(a.index.cmp(&b.index)));
        rows
    }

    /// Index of the accepted window within the sorted candidates
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// Number of items added by chained extension
    pub fn extension_len(&self) -> usize {
        self.items.len() - self.window_len
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Output form of the column
    pub fn entries(&self) -> Vec<ColumnEntry> {
        self.items
            .iter()
            .map(|item| ColumnEntry {
                text: item.text.clone(),
                anchor: item.anchor,
            })
            .collect()
    }
}

/// One name in the reconstructed column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnEntry {
    pub text: String,
    pub anchor: Point,
}

/// Name items sorted by anchor x, ties kept in detection order
pub fn name_candidates<'a, I>(items: I) -> Vec<&'a TextItem>
where
    I: IntoIterator<Item = &'a TextItem>,
{
    let mut candidates: Vec<&TextItem> = items
        .into_iter()
        .filter(|item| item.kind == TextKind::Name)
        .collect();
    candidates.sort_by(|a, b| a.anchor.x.total_cmp(&b.anchor.x).then(a.index.cmp(&b.index)));
    candidates
}

/// Whether every item of `window` lies within `tolerance` times the first item's x
pub fn window_accepted(window: &[&TextItem], tolerance: f64) -> bool {
    let Some(first) = window.first() else {
        return false;
    };
    let limit = tolerance * first.anchor.x;
    window.iter().all(|item| item.anchor.x <= limit)
}

/// Locate the player-name column among `items`
pub fn reconstruct_name_column<'a, I>(
    items: I,
    config: &ColumnConfig,
) -> Result<ScoreboardColumn<'a>, ParseError>
where
    I: IntoIterator<Item = &'a TextItem>,
{
    let candidates = name_candidates(items);
    find_column(&candidates, config)
}

/// Steps B and C over already sorted candidates
pub fn find_column<'a>(
    candidates: &[&'a TextItem],
    config: &ColumnConfig,
) -> Result<ScoreboardColumn<'a>, ParseError> {
    let window_len = config.min_column_size;
    let not_found = ParseError::NoColumnFound {
        window: window_len,
        candidates: candidates.len(),
    };

    if window_len == 0 || candidates.len() < window_len {
        debug!(
            "Only {} name candidates, need at least {}",
            candidates.len(),
            window_len
        );
        return Err(not_found);
    }

    let start = (0..=candidates.len() - window_len)
        .find(|&i| window_accepted(&candidates[i..i + window_len], config.tolerance))
        .ok_or(not_found)?;

    let mut items: Vec<&TextItem> = candidates[start..start + window_len].to_vec();
    let mut last_x = items[window_len - 1].anchor.x;

    for &candidate in &candidates[start + window_len..] {
        if candidate.anchor.x >= config.secondary_tolerance * last_x {
            break;
        }
        items.push(candidate);
        last_x = candidate.anchor.x;
    }

    info!(
        "Found name column at candidate {} with {} items ({} chained)",
        start,
        items.len(),
        items.len() - window_len
    );

    Ok(ScoreboardColumn {
        items,
        window_start: start,
        window_len,
    })
}
