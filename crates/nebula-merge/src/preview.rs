//! Text preview of which texture lands in which atlas cell.

use std::fmt::Write;
use std::path::PathBuf;

use nebula_grid::GridLayout;

/// Renders `grid` as text, top row first, labelling each cell with its
/// index and the file stem of the texture bound to it (`-` when empty).
///
/// `bindings` is aligned to the submesh order; cells past its end are empty.
pub fn render_preview(grid: &GridLayout, bindings: &[Option<PathBuf>]) -> String {
    let labels: Vec<String> = (0..grid.cell_count())
        .map(|t| {
            let name = bindings
                .get(t)
                .and_then(Option::as_ref)
                .and_then(|path| path.file_stem())
                .map_or_else(|| "-".into(), |stem| stem.to_string_lossy());
            format!("{t}:{name}")
        })
        .collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for row in grid.preview_rows() {
        let line: Vec<String> = row
            .iter()
            .map(|&t| format!("[{:<width$}]", labels[t]))
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}
