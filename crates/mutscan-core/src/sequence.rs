use crate::alphabet::is_amino_acid;
use crate::error::{Result, ScanError};
use std::fmt;
use std::str::FromStr;

/// A wild-type protein sequence over the 20 standard amino acids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinSequence(String);

impl ProteinSequence {
    /// Uppercases the input and strips whitespace (pasted multi-line FASTA
    /// bodies are accepted). Any other non-amino-acid symbol is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let mut invalid = cleaned.chars().filter(|c| !is_amino_acid(*c));
        if let Some(first) = invalid.next() {
            return Err(ScanError::InvalidSequence {
                count: 1 + invalid.count(),
                first,
            });
        }
        if cleaned.is_empty() {
            return Err(ScanError::EmptySequence);
        }
        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Residue at a 0-based index. Sequences are ASCII so bytes are symbols.
    pub fn residue(&self, idx: usize) -> Option<char> {
        self.0.as_bytes().get(idx).map(|b| *b as char)
    }

    /// Copy of the sequence with the residue at `idx` replaced.
    pub fn substitute(&self, idx: usize, symbol: char) -> String {
        let mut out = String::with_capacity(self.0.len());
        out.push_str(&self.0[..idx]);
        out.push(symbol);
        out.push_str(&self.0[idx + 1..]);
        out
    }
}

impl FromStr for ProteinSequence {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ProteinSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
