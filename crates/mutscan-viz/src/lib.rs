//! mutscan-viz
//!
//! SVG plots of a [`ScanResult`]. A full scan gets a heatmap and a
//! per-position boxplot; a mutation list gets a score density graph.
pub mod plots;
pub mod style;

use mutscan_core::{Result, ScanResult};
use std::path::PathBuf;
use svg::Document;

pub use plots::{boxplot_document, density_document, heatmap_document, BoxStats, Histogram};
pub use style::PlotStyle;

/// Turns a finished scan into image files named after `prefix`.
pub trait ScanRenderer {
    fn render(&self, result: &ScanResult, prefix: &str) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    style: PlotStyle,
}

impl SvgRenderer {
    pub fn new(style: PlotStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &PlotStyle {
        &self.style
    }

    fn save(&self, prefix: &str, name: &str, doc: &Document) -> Result<PathBuf> {
        let path = PathBuf::from(format!("{}-{}", prefix, name));
        svg::save(&path, doc)?;
        tracing::info!(path = %path.display(), "wrote plot");
        Ok(path)
    }
}

impl ScanRenderer for SvgRenderer {
    fn render(&self, result: &ScanResult, prefix: &str) -> Result<Vec<PathBuf>> {
        if let Some(matrix) = &result.matrix {
            return Ok(vec![
                self.save(prefix, "matrix.svg", &heatmap_document(matrix, &self.style))?,
                self.save(prefix, "boxplot.svg", &boxplot_document(matrix, &self.style))?,
            ]);
        }
        let Some((_, scores)) = result.table.columns().next() else {
            return Ok(Vec::new());
        };
        let doc = density_document(result.table.labels(), scores, &self.style);
        Ok(vec![self.save(prefix, "graph.svg", &doc)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutscan_core::{ProteinSequence, ScoreMatrix, ScoreTable, AMINO_ACIDS};
    use std::fs;

    fn exhaustive(sequence: &str) -> ScanResult {
        let labels: Vec<String> = sequence
            .chars()
            .enumerate()
            .flat_map(|(i, wt)| AMINO_ACIDS.chars().map(move |mt| format!("{}{}{}", wt, i + 1, mt)))
            .collect();
        let scores = (0..labels.len()).map(|i| (i % 7) as f32 - 3.0).collect();
        let mut table = ScoreTable::new(labels);
        table.add_column("toy", scores).unwrap();
        let sequence = ProteinSequence::parse(sequence).unwrap();
        let matrix = ScoreMatrix::from_table(&table, "toy", &sequence, 1).unwrap();
        ScanResult {
            table,
            matrix: Some(matrix),
        }
    }

    #[test]
    fn test_exhaustive_scan_renders_matrix_and_boxplot() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("scan").display().to_string();
        let paths = SvgRenderer::default().render(&exhaustive("MKT"), &prefix).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("scan-matrix.svg"));
        assert!(paths[1].ends_with("scan-boxplot.svg"));
        let heatmap = fs::read_to_string(&paths[0]).unwrap();
        assert!(heatmap.contains("<svg"));
        assert!(heatmap.contains("K2"));
        assert!(heatmap.contains("rgb("));
    }

    #[test]
    fn test_mutation_list_renders_density_graph() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("list").display().to_string();
        let mut table = ScoreTable::new(vec!["M1A".into(), "K2R".into()]);
        table.add_column("toy", vec![-1.0, 0.5]).unwrap();
        let result = ScanResult {
            table,
            matrix: None,
        };
        let paths = SvgRenderer::default().render(&result, &prefix).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("list-graph.svg"));
        assert!(fs::read_to_string(&paths[0]).unwrap().contains("K2R"));
    }
}
