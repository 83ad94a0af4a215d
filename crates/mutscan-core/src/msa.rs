//! Multiple sequence alignments for alignment-aware models.
//!
//! Alignments are read from a3m files: FASTA records where lowercase
//! letters and `.` mark insertions relative to the query (the first record).
//! Insertions are dropped so that every row has the query's width.
use crate::error::{Result, ScanError};
use bio::io::fasta;
use std::fs::File;
use std::path::Path;

/// Remove insertion columns from an a3m row.
pub fn remove_insertions(row: &str) -> String {
    row.chars()
        .filter(|c| !(c.is_ascii_lowercase() || *c == '.' || *c == '*'))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Alignment {
    /// (description, aligned row) pairs, query first.
    rows: Vec<(String, String)>,
}

impl Alignment {
    pub fn new(rows: Vec<(String, String)>) -> Result<Self> {
        let Some((_, query)) = rows.first() else {
            return Err(ScanError::InvalidAlignment(
                "the alignment has no sequences".to_string(),
            ));
        };
        let width = query.len();
        if let Some((name, row)) = rows.iter().find(|(_, row)| row.len() != width) {
            return Err(ScanError::InvalidAlignment(format!(
                "row '{}' has {} columns but the query has {}",
                name,
                row.len(),
                width
            )));
        }
        Ok(Self { rows })
    }

    /// Read the first `nseq` records of an a3m file.
    pub fn read_a3m<P: AsRef<Path>>(path: P, nseq: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ScanError::MissingAlignment(format!(
                "alignment file {} not found",
                path.display()
            )));
        }
        let reader = fasta::Reader::new(File::open(path)?);
        let mut rows = Vec::with_capacity(nseq);
        for record in reader.records().take(nseq) {
            let record = record?;
            let name = match record.desc() {
                Some(desc) => format!("{} {}", record.id(), desc),
                None => record.id().to_string(),
            };
            let row = String::from_utf8_lossy(record.seq());
            rows.push((name, remove_insertions(&row)));
        }
        tracing::debug!(path = %path.display(), rows = rows.len(), "read alignment");
        Self::new(rows)
    }

    pub fn query(&self) -> &str {
        &self.rows[0].1
    }

    /// Number of aligned sequences.
    pub fn depth(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows[0].1.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(_, row)| row.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_insertions() {
        assert_eq!(remove_insertions("AC-Dkl.E*"), "AC-DE");
        assert_eq!(remove_insertions("ACDE"), "ACDE");
    }

    #[test]
    fn test_read_a3m() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("query.a3m");
        std::fs::write(
            &path,
            ">query\nMKVLA\n>hit1 some description\nMKiiVLG\n>hit2\n-K.VLA\n>hit3\nMRVLA\n",
        )?;
        let msa = Alignment::read_a3m(&path, 3)?;
        assert_eq!(msa.depth(), 3);
        assert_eq!(msa.width(), 5);
        assert_eq!(msa.query(), "MKVLA");
        let rows: Vec<&str> = msa.rows().collect();
        assert_eq!(rows, ["MKVLA", "MKVLG", "-KVLA"]);
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Alignment::read_a3m("/nonexistent/query.a3m", 10),
            Err(ScanError::MissingAlignment(_))
        ));
    }

    #[test]
    fn test_ragged_rows() {
        let rows = vec![
            ("q".to_string(), "MKV".to_string()),
            ("h".to_string(), "MK".to_string()),
        ];
        let err = Alignment::new(rows).unwrap_err();
        assert!(matches!(err, ScanError::InvalidAlignment(_)));
        assert!(err.to_string().starts_with("invalid alignment"));
    }

    #[test]
    fn test_empty_alignment() -> Result<()> {
        assert!(matches!(
            Alignment::new(Vec::new()),
            Err(ScanError::InvalidAlignment(_))
        ));
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.a3m");
        std::fs::write(&path, "")?;
        assert!(matches!(
            Alignment::read_a3m(&path, 10),
            Err(ScanError::InvalidAlignment(_))
        ));
        Ok(())
    }
}
