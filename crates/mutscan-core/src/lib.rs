//! mutscan-core
//!
//! Saturation mutagenesis with masked protein language models: enumerate or
//! parse mutations, score them from model log-probabilities and assemble the
//! scores into a table and, for full scans, a position × substitution matrix.
//!
//! The model itself is anything implementing [`LanguageModel`].
pub mod alphabet;
pub mod assemble;
pub mod error;
pub mod model;
pub mod msa;
pub mod mutation;
pub mod scan;
pub mod scoring;
pub mod sequence;

pub use alphabet::{Alphabet, SpecialTokens, AMINO_ACIDS, AMINO_ACID_COUNT};
pub use assemble::{ScanResult, ScoreMatrix, ScoreTable};
pub use error::{Result, ScanError};
pub use model::{LanguageModel, ModelKind, SequenceModelAdapter};
pub use msa::Alignment;
pub use mutation::{
    generate_all_mutations, generate_all_mutations_with_offset, parse_user_indels,
    parse_user_mutations, read_mutations_csv, write_label_list, Indel, Mutation, MutationInput,
};
pub use scan::ScanConfig;
pub use scoring::ScoringStrategy;
pub use sequence::ProteinSequence;
