//! mutscan-test-data
//!
//! Test files embedded in the crate, plus [`ToyModel`], a small deterministic
//! stand-in for a protein language model so scans can be tested offline.
//!
//! The test files are represented as `TestFile` objects which package the raw
//! bytes and create temporary files for programs to operate on.
use candle_core::{Device, Tensor};
use mutscan_core::{Alphabet, LanguageModel, ModelKind, Result};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{Builder, NamedTempFile};

/// Query of [`TestFile::alignment_01`], also the sequence the DMS file refers to.
pub const EXAMPLE_SEQUENCE: &str = "MKTAYIAKQR";

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use mutscan_test_data::TestFile;
/// let (msa_file, _temp) = TestFile::alignment_01().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// Five-row a3m alignment of [`EXAMPLE_SEQUENCE`], with insertions.
    pub fn alignment_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/alignments/example.a3m"),
            suffix: "a3m",
        }
    }

    /// Deep mutational scan table with a `mutant` column.
    pub fn dms_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/dms/example.csv"),
            suffix: "csv",
        }
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }
}

/// A deterministic masked language model over the ESM vocabulary.
///
/// The logit of token `v` at position `t` is
/// `0.5 * v + 0.2 * [v == tokens[t], unmasked] + 0.1 * [v == tokens[t - 1]]`,
/// and for alignment input `+ 0.1 * (share of the other rows with v at t)`.
/// The base term spaces tokens 0.5 apart, so the unmasked self bonus never
/// flips the sign of a log-odds.
///
/// Forward calls and the number of sequences they carried are counted.
pub struct ToyModel {
    name: String,
    alphabet: Alphabet,
    kind: ModelKind,
    max_length: Option<usize>,
    calls: AtomicUsize,
    rows: AtomicUsize,
}

impl Default for ToyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ToyModel {
    pub fn new() -> Self {
        Self {
            name: "toy".to_string(),
            alphabet: Alphabet::esm1b(),
            kind: ModelKind::SingleSequence,
            max_length: None,
            calls: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
        }
    }

    /// Alignment-aware variant with the MSA Transformer vocabulary.
    pub fn alignment() -> Self {
        Self {
            name: "toy-msa".to_string(),
            alphabet: Alphabet::msa_transformer(),
            kind: ModelKind::Alignment,
            ..Self::new()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Number of `logits` calls so far.
    pub fn forward_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of batch entries passed to `logits` so far.
    pub fn forward_rows(&self) -> usize {
        self.rows.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.rows.store(0, Ordering::SeqCst);
    }

    /// Logits for one row of tokens; `others` are the remaining rows of an
    /// alignment.
    pub fn row_logits(&self, row: &[u32], others: &[&[u32]]) -> Vec<f32> {
        let vocab = self.alphabet.len();
        let mask = self.alphabet.mask_idx();
        let mut out = Vec::with_capacity(row.len() * vocab);
        for (t, &token) in row.iter().enumerate() {
            for v in 0..vocab as u32 {
                let mut logit = 0.5 * v as f32;
                if token == v && token != mask {
                    logit += 0.2;
                }
                if t > 0 && row[t - 1] == v {
                    logit += 0.1;
                }
                if !others.is_empty() {
                    let agree = others.iter().filter(|other| other[t] == v).count();
                    logit += 0.1 * agree as f32 / others.len() as f32;
                }
                out.push(logit);
            }
        }
        out
    }
}

impl LanguageModel for ToyModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.max_length
    }

    fn logits(&self, tokens: &Tensor) -> Result<Tensor> {
        let vocab = self.alphabet.len();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match tokens.rank() {
            2 => {
                let batch = tokens.to_vec2::<u32>()?;
                self.rows.fetch_add(batch.len(), Ordering::SeqCst);
                let width = batch.first().map_or(0, Vec::len);
                let data: Vec<f32> = batch
                    .iter()
                    .flat_map(|row| self.row_logits(row, &[]))
                    .collect();
                Ok(Tensor::from_vec(
                    data,
                    (batch.len(), width, vocab),
                    &Device::Cpu,
                )?)
            }
            _ => {
                let batch = tokens.to_vec3::<u32>()?;
                self.rows.fetch_add(batch.len(), Ordering::SeqCst);
                let depth = batch.first().map_or(0, Vec::len);
                let width = batch
                    .first()
                    .and_then(|msa| msa.first())
                    .map_or(0, Vec::len);
                let mut data = Vec::with_capacity(batch.len() * depth * width * vocab);
                for msa in &batch {
                    for (n, row) in msa.iter().enumerate() {
                        let others: Vec<&[u32]> = msa
                            .iter()
                            .enumerate()
                            .filter(|(m, _)| *m != n)
                            .map(|(_, other)| other.as_slice())
                            .collect();
                        data.extend(self.row_logits(row, &others));
                    }
                }
                Ok(Tensor::from_vec(
                    data,
                    (batch.len(), depth, width, vocab),
                    &Device::Cpu,
                )?)
            }
        }
    }
}
