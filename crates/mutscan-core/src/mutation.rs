//! Mutation labels.
//!
//! Point mutations are written `<wt><pos><mt>` (e.g. `M1A`) with a 1-based
//! position. Indels carry the full mutated sequence and the index of the
//! edit. [`MutationInput`] is the resolved form of the user's request.
use crate::alphabet::{is_amino_acid, AMINO_ACIDS};
use crate::error::{Result, ScanError};
use crate::sequence::ProteinSequence;
use polars::prelude::{CsvReadOptions, SerReader};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Header of the label list files and of the first table column.
pub const MUTATION_COLUMN: &str = "mutant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mutation {
    pub wild_type: char,
    pub position: usize,
    pub mutant: char,
}

impl Mutation {
    pub fn new(wild_type: char, position: usize, mutant: char) -> Self {
        Self {
            wild_type,
            position,
            mutant,
        }
    }

    /// True when the mutant symbol equals the wild type.
    pub fn is_synonymous(&self) -> bool {
        self.wild_type == self.mutant
    }

    /// Resolve the label to a 0-based sequence index, checking that the
    /// listed wild type matches the sequence.
    pub fn locate(&self, sequence: &ProteinSequence, offset: usize) -> Result<usize> {
        let out_of_range = || ScanError::PositionOutOfRange {
            label: self.to_string(),
            position: self.position,
            length: sequence.len(),
            offset,
        };
        let idx = self.position.checked_sub(offset).ok_or_else(out_of_range)?;
        let found = sequence.residue(idx).ok_or_else(out_of_range)?;
        if found != self.wild_type {
            return Err(ScanError::InconsistentMutation {
                label: self.to_string(),
                position: self.position,
                expected: self.wild_type,
                found,
            });
        }
        Ok(idx)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.wild_type, self.position, self.mutant)
    }
}

impl FromStr for Mutation {
    type Err = ScanError;

    fn from_str(label: &str) -> Result<Self> {
        let label = label.trim();
        let mut chars = label.chars();
        let (Some(wild_type), Some(mutant)) = (chars.next(), chars.next_back()) else {
            return Err(ScanError::malformed(label, "expected <wt><pos><mt>"));
        };
        let digits = chars.as_str();
        if digits.is_empty() {
            return Err(ScanError::malformed(label, "missing position"));
        }
        for symbol in [wild_type, mutant] {
            if !is_amino_acid(symbol) {
                return Err(ScanError::malformed(
                    label,
                    format!("'{}' is not one of {}", symbol, AMINO_ACIDS),
                ));
            }
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScanError::malformed(
                label,
                format!("position '{}' is not an integer", digits),
            ));
        }
        let position: usize = digits
            .parse()
            .map_err(|e| ScanError::malformed(label, format!("position '{}': {}", digits, e)))?;
        if position == 0 {
            return Err(ScanError::malformed(label, "position must be positive"));
        }
        Ok(Self::new(wild_type, position, mutant))
    }
}

/// An insertion or deletion, given as the full mutated sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indel {
    pub sequence: String,
    pub index: usize,
}

impl fmt::Display for Indel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.sequence)
    }
}

/// Every substitution at every position, labeled from position 1.
pub fn generate_all_mutations(sequence: &ProteinSequence) -> Vec<Mutation> {
    generate_all_mutations_with_offset(sequence, 1)
}

/// Every substitution at every position, position-major then in
/// [`AMINO_ACIDS`] order, the wild-type no-op included.
pub fn generate_all_mutations_with_offset(
    sequence: &ProteinSequence,
    offset: usize,
) -> Vec<Mutation> {
    sequence
        .as_str()
        .chars()
        .enumerate()
        .flat_map(|(i, wt)| {
            AMINO_ACIDS
                .chars()
                .map(move |mt| Mutation::new(wt, i + offset, mt))
        })
        .collect()
}

/// Parse a comma-separated list such as `"M1A, E2C"`, keeping user order.
pub fn parse_user_mutations(text: &str) -> Result<Vec<Mutation>> {
    text.split(',').map(str::parse).collect()
}

/// Parse a comma-separated list of alternating `<sequence>,<index>` items.
pub fn parse_user_indels(text: &str) -> Result<Vec<Indel>> {
    let items: Vec<&str> = text.split(',').map(str::trim).collect();
    if items.len() % 2 != 0 {
        return Err(ScanError::MalformedIndel {
            reason: format!(
                "expected <sequence>,<index> pairs but found {} items",
                items.len()
            ),
        });
    }
    items
        .chunks(2)
        .map(|pair| {
            let sequence = pair[0].to_ascii_uppercase();
            if sequence.is_empty() || !sequence.chars().all(is_amino_acid) {
                return Err(ScanError::MalformedIndel {
                    reason: format!("'{}' is not an amino-acid sequence", pair[0]),
                });
            }
            let index = pair[1].parse().map_err(|_| ScanError::MalformedIndel {
                reason: format!("index '{}' is not a non-negative integer", pair[1]),
            })?;
            Ok(Indel { sequence, index })
        })
        .collect()
}

/// Read mutation labels from one column of a deep mutational scan CSV.
pub fn read_mutations_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<Mutation>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    let labels = df.column(column)?.as_materialized_series().str()?;
    labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| {
            label
                .ok_or_else(|| {
                    ScanError::malformed("", format!("row {} of '{}' is empty", row + 1, column))
                })?
                .parse()
        })
        .collect()
}

/// What to score, resolved once from the user's options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationInput {
    ExhaustiveScan,
    UserMutations(Vec<Mutation>),
    UserIndels(Vec<Indel>),
}

impl MutationInput {
    /// At most one of the sources may be given; empty strings count as
    /// absent. With none of them the whole sequence is scanned.
    pub fn resolve(
        mutations: Option<&str>,
        indels: Option<&str>,
        dms_csv: Option<(&Path, &str)>,
    ) -> Result<Self> {
        let mutations = mutations.filter(|s| !s.trim().is_empty());
        let indels = indels.filter(|s| !s.trim().is_empty());
        let given = [mutations.is_some(), indels.is_some(), dms_csv.is_some()];
        if given.iter().filter(|g| **g).count() > 1 {
            return Err(ScanError::ConflictingInputs(
                "a mutation list, an indel list and a DMS file are mutually exclusive"
                    .to_string(),
            ));
        }
        match (mutations, indels, dms_csv) {
            (Some(text), _, _) => Ok(Self::UserMutations(parse_user_mutations(text)?)),
            (_, Some(text), _) => Ok(Self::UserIndels(parse_user_indels(text)?)),
            (_, _, Some((path, column))) => {
                Ok(Self::UserMutations(read_mutations_csv(path, column)?))
            }
            _ => Ok(Self::ExhaustiveScan),
        }
    }

    pub fn is_exhaustive(&self) -> bool {
        matches!(self, Self::ExhaustiveScan)
    }

    /// Point mutations to score; the full scan is expanded here.
    pub fn mutations(&self, sequence: &ProteinSequence, offset: usize) -> Vec<Mutation> {
        match self {
            Self::ExhaustiveScan => generate_all_mutations_with_offset(sequence, offset),
            Self::UserMutations(list) => list.clone(),
            Self::UserIndels(_) => Vec::new(),
        }
    }

    /// Row labels in scoring order.
    pub fn labels(&self, sequence: &ProteinSequence, offset: usize) -> Vec<String> {
        match self {
            Self::UserIndels(indels) => indels.iter().map(ToString::to_string).collect(),
            _ => self
                .mutations(sequence, offset)
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Suffix of the label list file written for this input.
    pub fn list_file_suffix(&self) -> &'static str {
        match self {
            Self::ExhaustiveScan => "all-mutants.txt",
            Self::UserMutations(_) => "user-mutants.txt",
            Self::UserIndels(_) => "user-indels.txt",
        }
    }
}

/// Write one label per line under a `mutant` header.
pub fn write_label_list<P: AsRef<Path>>(path: P, labels: &[String]) -> Result<()> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(out, "{}", MUTATION_COLUMN)?;
    for label in labels {
        writeln!(out, "{}", label)?;
    }
    out.flush()?;
    Ok(())
}
