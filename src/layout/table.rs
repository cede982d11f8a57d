//! Table classification and markdown rendering.

/// Decide whether a detected grid is a real table.
///
/// Table finders fire on multi-line prose columns far too often; such false
/// positives come back as grids where most rows hold a single populated
/// cell. A grid is rejected when it is empty, when any row is empty, or when
/// the share of rows with at most one non-empty cell exceeds
/// `single_cell_row_ratio`.
pub fn is_real_table(cells: &[Vec<String>], single_cell_row_ratio: f32) -> bool {
    if cells.is_empty() || cells.iter().any(|row| row.is_empty()) {
        return false;
    }

    let single_cell_rows = cells
        .iter()
        .filter(|row| row.iter().filter(|c| !c.trim().is_empty()).count() <= 1)
        .count();

    (single_cell_rows as f32 / cells.len() as f32) <= single_cell_row_ratio
}

/// Render a cell grid as a GFM pipe table.
///
/// Row 0 becomes the header, followed by a `---` separator with one cell per
/// column, then the remaining rows. The column count is the widest row;
/// shorter rows are padded with empty cells. A grid without columns renders
/// as an empty string.
pub fn table_to_markdown(cells: &[Vec<String>]) -> String {
    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut rows = cells.iter();
    let mut out = String::new();

    if let Some(header) = rows.next() {
        out.push_str(&render_row(header, columns));
        out.push('\n');
    }
    out.push_str(&render_row(&vec!["---".to_string(); columns], columns));

    for row in rows {
        out.push('\n');
        out.push_str(&render_row(row, columns));
    }

    out
}

fn render_row(row: &[String], columns: usize) -> String {
    let cells: Vec<String> = (0..columns)
        .map(|i| row.get(i).map(|c| escape_cell(c)).unwrap_or_default())
        .collect();
    format!("| {} |", cells.join(" | "))
}

/// Keep a cell on one line and stop embedded pipes from splitting it.
fn escape_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
