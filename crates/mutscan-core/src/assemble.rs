//! Score tables and the position × substitution matrix.
use crate::alphabet::{AMINO_ACIDS, AMINO_ACID_COUNT};
use crate::error::{Result, ScanError};
use crate::mutation::{generate_all_mutations_with_offset, MUTATION_COLUMN};
use crate::sequence::ProteinSequence;
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};

/// First column of the matrix CSV.
pub const WILD_TYPE_COLUMN: &str = "wild_type";

/// Labels plus one score column per model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    labels: Vec<String>,
    columns: Vec<(String, Vec<f32>)>,
}

impl ScoreTable {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, name: impl Into<String>, scores: Vec<f32>) -> Result<()> {
        if scores.len() != self.labels.len() {
            return Err(ScanError::ShapeMismatch {
                rows: scores.len(),
                positions: self.labels.len(),
                reason: format!(
                    "column has {} scores for {} labels",
                    scores.len(),
                    self.labels.len()
                ),
            });
        }
        let name = name.into();
        if self.column(&name).is_some() || name == MUTATION_COLUMN {
            return Err(ScanError::ConflictingInputs(format!(
                "duplicate score column '{}'",
                name
            )));
        }
        self.columns.push((name, scores));
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, scores)| scores.as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.columns
            .iter()
            .map(|(name, scores)| (name.as_str(), scores.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(MUTATION_COLUMN.into(), &self.labels)];
        for (name, scores) in &self.columns {
            columns.push(Column::new(name.as_str().into(), scores));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_dataframe(&mut self.to_dataframe()?, path.as_ref())
    }
}

/// Scores of an exhaustive scan as `len(sequence)` rows × 20 mutant letters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    /// `"<wt><pos>"` per row.
    positions: Vec<String>,
    values: Vec<[f32; AMINO_ACID_COUNT]>,
}

impl ScoreMatrix {
    /// Reshape one column of an exhaustive-scan table. The labels must be
    /// exactly those of the enumerator, in its order.
    pub fn from_table(
        table: &ScoreTable,
        column: &str,
        sequence: &ProteinSequence,
        offset: usize,
    ) -> Result<Self> {
        let rows = table.len();
        let mismatch = |reason: String| ScanError::ShapeMismatch {
            rows,
            positions: sequence.len(),
            reason,
        };
        if rows % AMINO_ACID_COUNT != 0 {
            return Err(mismatch("row count is not a multiple of 20".to_string()));
        }
        if rows != sequence.len() * AMINO_ACID_COUNT {
            return Err(mismatch(format!(
                "expected {} rows",
                sequence.len() * AMINO_ACID_COUNT
            )));
        }
        let expected = generate_all_mutations_with_offset(sequence, offset);
        if let Some((found, wanted)) = table
            .labels()
            .iter()
            .zip(expected.iter())
            .find(|(label, m)| **label != m.to_string())
        {
            return Err(mismatch(format!(
                "label '{}' where '{}' was expected",
                found, wanted
            )));
        }
        let scores = table
            .column(column)
            .ok_or_else(|| mismatch(format!("no score column named '{}'", column)))?;

        let positions = sequence
            .as_str()
            .chars()
            .enumerate()
            .map(|(i, wt)| format!("{}{}", wt, i + offset))
            .collect();
        let values = scores
            .chunks_exact(AMINO_ACID_COUNT)
            .map(|chunk| {
                let mut row = [0.0; AMINO_ACID_COUNT];
                row.copy_from_slice(chunk);
                row
            })
            .collect();
        Ok(Self { positions, values })
    }

    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    /// Column letters, in [`AMINO_ACIDS`] order.
    pub fn mutants(&self) -> impl Iterator<Item = char> {
        AMINO_ACIDS.chars()
    }

    pub fn rows(&self) -> &[[f32; AMINO_ACID_COUNT]] {
        &self.values
    }

    pub fn n_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn get(&self, row: usize, mutant: char) -> Option<f32> {
        let col = AMINO_ACIDS.find(mutant)?;
        self.values.get(row).map(|r| r[col])
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new(WILD_TYPE_COLUMN.into(), &self.positions)];
        for (col, letter) in AMINO_ACIDS.chars().enumerate() {
            let values: Vec<f32> = self.values.iter().map(|row| row[col]).collect();
            columns.push(Column::new(letter.to_string().as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_dataframe(&mut self.to_dataframe()?, path.as_ref())
    }
}

fn write_dataframe(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Everything a scan produces.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub table: ScoreTable,
    /// Only for exhaustive scans.
    pub matrix: Option<ScoreMatrix>,
}

impl ScanResult {
    /// Write `<prefix>-res-in-list.csv` and, when present,
    /// `<prefix>-res-in-matrix.csv`. Returns the written paths.
    pub fn write_csv(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let list = PathBuf::from(format!("{}-res-in-list.csv", prefix));
        self.table.write_csv(&list)?;
        tracing::info!(path = %list.display(), rows = self.table.len(), "wrote score table");
        let mut written = vec![list];
        if let Some(matrix) = &self.matrix {
            let path = PathBuf::from(format!("{}-res-in-matrix.csv", prefix));
            matrix.write_csv(&path)?;
            tracing::info!(path = %path.display(), "wrote score matrix");
            written.push(path);
        }
        Ok(written)
    }
}
