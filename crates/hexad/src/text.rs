//! Plain-text grids: rows separated by `;`, cells by `,`.
//!
//! ```rust
//! # use hexad::text::{parse_grid, render_grid};
//! # use hexad::CellValue;
//! let grid = parse_grid("1,2.5;x,");
//! assert_eq!(grid[0], vec![CellValue::Int(1), CellValue::Number(2.5)]);
//! assert_eq!(render_grid(&grid), "1\t2.5\nx\t\n");
//! ```

use hexad_common::{CellValue, Grid};

pub const ROW_SEPARATOR: char = ';';
pub const CELL_SEPARATOR: char = ',';

/// Parse cells with [`CellValue::parse`]. Empty input is an empty grid.
pub fn parse_grid(text: &str) -> Grid {
    if text.trim().is_empty() {
        return Grid::new();
    }
    text.split(ROW_SEPARATOR)
        .map(|row| row.split(CELL_SEPARATOR).map(CellValue::parse).collect())
        .collect()
}

/// Integer rows, for size grids. Fails on the first cell that is not an
/// integer and returns its text.
pub fn parse_int_grid(text: &str) -> Result<Vec<Vec<i64>>, String> {
    parse_grid(text)
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_integer().ok_or_else(|| cell.to_string()))
                .collect()
        })
        .collect()
}

/// Tab-separated lines, one per row.
pub fn render_grid(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid {
        let cells: Vec<String> = row.iter().map(CellValue::to_string).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_typed() {
        let grid = parse_grid("1, -2 ,3.5;abc,,7");
        assert_eq!(
            grid,
            vec![
                vec![CellValue::Int(1), CellValue::Int(-2), CellValue::Number(3.5)],
                vec![CellValue::from("abc"), CellValue::Empty, CellValue::Int(7)],
            ]
        );
    }

    #[test]
    fn blank_text_is_an_empty_grid() {
        assert!(parse_grid("  ").is_empty());
    }

    #[test]
    fn size_grids_must_be_integral() {
        assert_eq!(parse_int_grid("12,-16").unwrap(), vec![vec![12, -16]]);
        assert_eq!(parse_int_grid("3;4").unwrap(), vec![vec![3], vec![4]]);
        assert_eq!(parse_int_grid("3,x").unwrap_err(), "x");
    }

    #[test]
    fn rendering_uses_tabs() {
        let grid = vec![vec![CellValue::Int(1), CellValue::Empty]];
        assert_eq!(render_grid(&grid), "1\t\n");
    }
}
