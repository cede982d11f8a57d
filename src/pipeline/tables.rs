//! Stream-mode table finder.
//!
//! Detects tables from text alignment alone, without ruling lines:
//!
//! 1. Group text runs into rows by their `top` edge.
//! 2. Merge runs of a row into cells; a horizontal gap of at least
//!    `min_column_gap` points starts a new cell.
//! 3. Consecutive rows holding at least `min_columns` cells form a candidate
//!    region; regions shorter than `min_rows` are dropped.
//! 4. Column edges are the clustered left edges of a region's cells; every
//!    cell is assigned to the nearest edge on its left.
//!
//! The result is a list of [`RawTable`]s. Whether one is a *real* table is
//! decided later by [`crate::layout::is_real_table`].

use crate::layout::{BBox, RawTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Tuning for the stream-mode table finder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableFinderConfig {
    /// Minimum number of consecutive tabular rows. Default: 2.
    pub min_rows: usize,
    /// Minimum number of cells for a row to count as tabular. Default: 2.
    pub min_columns: usize,
    /// Regions with more columns are word-level splitting, not tables. Default: 8.
    pub max_columns: usize,
    /// Smallest horizontal gap, in points, separating two cells. Default: 15.0.
    pub min_column_gap: f32,
    /// Row tolerance as a fraction of run height. Default: 0.4.
    pub row_tolerance_factor: f32,
    /// A vertical gap larger than this multiple of row height ends a region.
    /// Default: 2.5.
    pub max_row_gap_ratio: f32,
}

impl Default for TableFinderConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            min_column_gap: 15.0,
            row_tolerance_factor: 0.4,
            max_row_gap_ratio: 2.5,
        }
    }
}

/// A contiguous run of text on a page, as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bbox: BBox,
}

impl TextRun {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// One cell candidate: merged runs with their union box.
#[derive(Debug, Clone)]
struct Cell {
    text: String,
    bbox: BBox,
}

#[derive(Debug, Clone)]
struct Row {
    top: f32,
    bottom: f32,
    cells: Vec<Cell>,
}

/// Find table regions among a page's text runs.
pub fn find_tables(runs: &[TextRun], config: &TableFinderConfig) -> Vec<RawTable> {
    let min_runs = config.min_rows * config.min_columns;
    if runs.len() < min_runs {
        debug!(
            "TableFinder: not enough runs ({} < {})",
            runs.len(),
            min_runs
        );
        return vec![];
    }

    let rows: Vec<Row> = group_into_rows(runs, config)
        .into_iter()
        .map(|row_runs| build_row(row_runs, config.min_column_gap))
        .collect();

    let mut tables = Vec::new();
    for (start, end) in find_regions(&rows, config) {
        let region = &rows[start..=end];
        let columns = detect_columns(region, config.min_column_gap);
        if columns.len() < config.min_columns {
            continue;
        }
        if columns.len() > config.max_columns {
            debug!(
                "TableFinder: skipping region, too many columns ({} > {})",
                columns.len(),
                config.max_columns
            );
            continue;
        }
        if is_list_pattern(region, columns.len()) {
            debug!("TableFinder: skipping region, detected as list pattern");
            continue;
        }
        tables.push(to_raw_table(region, &columns));
    }

    debug!("TableFinder: {} tables from {} rows", tables.len(), rows.len());
    tables
}

/// Group runs into rows by `top`, each row sorted by `x0`.
fn group_into_rows(runs: &[TextRun], config: &TableFinderConfig) -> Vec<Vec<TextRun>> {
    let mut sorted: Vec<TextRun> = runs
        .iter()
        .filter(|r| !r.text.trim().is_empty())
        .cloned()
        .collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut rows: Vec<Vec<TextRun>> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();
    let mut current_top: Option<f32> = None;

    for run in sorted {
        let tolerance = (run.bbox.height() * config.row_tolerance_factor).max(1.0);
        match current_top {
            Some(top) if (run.bbox.top - top).abs() <= tolerance => current.push(run),
            _ => {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current_top = Some(run.bbox.top);
                current.push(run);
            }
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    rows
}

/// Merge a row's runs into cells separated by gaps ≥ `min_gap`.
fn build_row(runs: Vec<TextRun>, min_gap: f32) -> Row {
    let mut cells: Vec<Cell> = Vec::new();
    for run in runs {
        match cells.last_mut() {
            Some(cell) if run.bbox.x0 - cell.bbox.x1 < min_gap => {
                cell.text.push(' ');
                cell.text.push_str(run.text.trim());
                cell.bbox = union(&cell.bbox, &run.bbox);
            }
            _ => cells.push(Cell {
                text: run.text.trim().to_string(),
                bbox: run.bbox,
            }),
        }
    }
    let top = cells
        .iter()
        .map(|c| c.bbox.top)
        .fold(f32::INFINITY, f32::min);
    let bottom = cells
        .iter()
        .map(|c| c.bbox.bottom)
        .fold(f32::NEG_INFINITY, f32::max);
    Row { top, bottom, cells }
}

/// Contiguous runs of tabular rows, as inclusive index ranges.
fn find_regions(rows: &[Row], config: &TableFinderConfig) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;

    for (i, row) in rows.iter().enumerate() {
        let tabular = row.cells.len() >= config.min_columns;
        let adjacent = match (start, i.checked_sub(1).map(|p| &rows[p])) {
            (Some(_), Some(prev)) => {
                let height = (prev.bottom - prev.top).max(1.0);
                row.top - prev.bottom <= height * config.max_row_gap_ratio
            }
            _ => true,
        };

        if tabular && adjacent {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            if i - s >= config.min_rows {
                regions.push((s, i - 1));
            }
        }
        if tabular {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        if rows.len() - s >= config.min_rows {
            regions.push((s, rows.len() - 1));
        }
    }
    regions
}

/// Column left edges: cell `x0`s clustered within `min_gap`.
fn detect_columns(rows: &[Row], min_gap: f32) -> Vec<f32> {
    let mut edges: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.cells.iter().map(|c| c.bbox.x0))
        .collect();
    edges.sort_by(f32::total_cmp);

    let mut merged: Vec<f32> = Vec::new();
    for edge in edges {
        match merged.last() {
            Some(&last) if edge - last < min_gap => {}
            _ => merged.push(edge),
        }
    }
    merged
}

/// Index of the right-most column starting at or before `x` (with slack).
fn column_for(x: f32, columns: &[f32], slack: f32) -> usize {
    columns
        .iter()
        .rposition(|&c| c <= x + slack)
        .unwrap_or(0)
}

fn to_raw_table(rows: &[Row], columns: &[f32]) -> RawTable {
    let mut bbox: Option<BBox> = None;
    let cells = rows
        .iter()
        .map(|row| {
            let mut out = vec![String::new(); columns.len()];
            for cell in &row.cells {
                bbox = Some(match bbox {
                    Some(b) => union(&b, &cell.bbox),
                    None => cell.bbox,
                });
                let slot = &mut out[column_for(cell.bbox.x0, columns, 1.0)];
                if !slot.is_empty() {
                    slot.push(' ');
                }
                slot.push_str(&cell.text);
            }
            out
        })
        .collect();
    RawTable {
        bbox: bbox.unwrap_or(BBox::new(0.0, 0.0, 0.0, 0.0)),
        cells,
    }
}

fn union(a: &BBox, b: &BBox) -> BBox {
    BBox::new(
        a.x0.min(b.x0),
        a.top.min(b.top),
        a.x1.max(b.x1),
        a.bottom.max(b.bottom),
    )
}

/// Whether the rows are a bulleted or numbered list that only looks tabular
/// because the marker and the item text are separate runs.
fn is_list_pattern(rows: &[Row], columns: usize) -> bool {
    if rows.is_empty() {
        return false;
    }
    let mut bullets = 0usize;
    let mut numbers = 0usize;
    for row in rows {
        let first = row
            .cells
            .iter()
            .min_by(|a, b| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal));
        if let Some(cell) = first {
            if is_bullet_marker(&cell.text) {
                bullets += 1;
            } else if is_number_marker(&cell.text) {
                numbers += 1;
            }
        }
    }
    let total = rows.len() as f32;
    if bullets as f32 / total >= 0.5 {
        return true;
    }
    // Numbered first columns are common in real tables; only reject the
    // two-column shape a list produces.
    columns == 2 && (bullets + numbers) as f32 / total >= 0.5
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "◆" | "▶" | "➤"
    )
}

/// `1.`, `12)`, `a.`, or a bare number.
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.parse::<u32>().is_ok() {
        return true;
    }
    let mut chars = cleaned.chars();
    if !matches!(chars.next_back(), Some('.') | Some(')')) {
        return false;
    }
    let head = chars.as_str();
    let digits = !head.is_empty() && head.chars().all(|c| c.is_ascii_digit());
    let letter = head.chars().count() == 1 && head.chars().all(char::is_alphabetic);
    digits || letter
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x0: f32, top: f32) -> TextRun {
        TextRun::new(
            text,
            BBox::new(x0, top, x0 + text.len() as f32 * 6.0, top + 10.0),
        )
    }

    fn two_by_three() -> Vec<TextRun> {
        vec![
            run("Name", 50.0, 100.0),
            run("Qty", 200.0, 100.0),
            run("Apple", 50.0, 114.0),
            run("3", 200.0, 114.0),
            run("Pear", 50.0, 128.0),
            run("12", 200.0, 128.0),
        ]
    }

    #[test]
    fn finds_simple_table() {
        let tables = find_tables(&two_by_three(), &TableFinderConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].cells,
            vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Apple".to_string(), "3".to_string()],
                vec!["Pear".to_string(), "12".to_string()],
            ]
        );
        assert_eq!(tables[0].bbox.top, 100.0);
        assert_eq!(tables[0].bbox.bottom, 138.0);
        assert_eq!(tables[0].bbox.x0, 50.0);
    }

    #[test]
    fn close_runs_merge_into_one_cell() {
        let runs = vec![
            run("Unit", 50.0, 100.0),
            run("price", 78.0, 100.0),
            run("Total", 200.0, 100.0),
            run("1.50", 50.0, 114.0),
            run("9.00", 200.0, 114.0),
        ];
        let tables = find_tables(&runs, &TableFinderConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cells[0], vec!["Unit price", "Total"]);
    }

    #[test]
    fn prose_is_not_a_table() {
        let runs = vec![
            run("This is a single paragraph line", 50.0, 100.0),
            run("and another line that follows it", 50.0, 114.0),
            run("closing the paragraph.", 50.0, 128.0),
            run("Stray", 50.0, 142.0),
        ];
        assert!(find_tables(&runs, &TableFinderConfig::default()).is_empty());
    }

    #[test]
    fn single_tabular_row_is_not_a_table() {
        let runs = vec![
            run("Left", 50.0, 100.0),
            run("Right", 300.0, 100.0),
            run("A paragraph follows below", 50.0, 114.0),
            run("and keeps going.", 50.0, 128.0),
        ];
        assert!(find_tables(&runs, &TableFinderConfig::default()).is_empty());
    }

    #[test]
    fn large_vertical_gap_splits_regions() {
        let mut runs = two_by_three();
        runs.push(run("X", 50.0, 400.0));
        runs.push(run("Y", 200.0, 400.0));
        runs.push(run("Z", 50.0, 414.0));
        runs.push(run("W", 200.0, 414.0));
        let tables = find_tables(&runs, &TableFinderConfig::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].cells.len(), 2);
    }

    #[test]
    fn missing_cell_leaves_empty_slot() {
        let runs = vec![
            run("A", 50.0, 100.0),
            run("B", 200.0, 100.0),
            run("C", 350.0, 100.0),
            run("D", 50.0, 114.0),
            run("F", 350.0, 114.0),
        ];
        let tables = find_tables(&runs, &TableFinderConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cells[1], vec!["D", "", "F"]);
    }

    #[test]
    fn bullet_list_not_detected_as_table() {
        let runs = vec![
            run("•", 50.0, 100.0),
            run("First item", 80.0, 100.0),
            run("•", 50.0, 114.0),
            run("Second item", 80.0, 114.0),
        ];
        assert!(find_tables(&runs, &TableFinderConfig::default()).is_empty());
    }

    #[test]
    fn numbered_list_not_detected_as_table() {
        let runs = vec![
            run("1.", 50.0, 100.0),
            run("First item", 80.0, 100.0),
            run("2.", 50.0, 114.0),
            run("Second item", 80.0, 114.0),
        ];
        assert!(find_tables(&runs, &TableFinderConfig::default()).is_empty());
    }

    #[test]
    fn number_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("a."));
        assert!(is_number_marker("7"));
        assert!(!is_number_marker("Apple"));
        assert!(!is_number_marker("."));
    }
}
