//! Scoring strategies.
//!
//! Each strategy turns model log-probabilities into one scalar per mutation,
//! higher meaning the mutant is predicted to be more favourable than the
//! wild type:
//!
//! * [`WtMarginals`]: `logP(mt) - logP(wt)` read from a single unmasked pass.
//! * [`MaskedMarginals`]: the same log-odds, read from one masked pass per
//!   residue. The passes are made once up front and shared by every
//!   mutation at that position. Alignment-aware models only support this one.
//! * [`PseudoPpl`]: pseudo-log-likelihood of the mutated sequence. Not a
//!   log-odds, so not comparable with the other two.
//! * [`IndelScorer`]: pseudo-log-likelihood difference between an indel
//!   sequence and the wild type.
mod marginals;
mod pseudo_ppl;

pub use marginals::{MaskedMarginals, WtMarginals};
pub use pseudo_ppl::{pseudo_log_likelihood, IndelScorer, PseudoPpl};

use crate::error::{Result, ScanError};
use crate::model::{LanguageModel, ModelKind, SequenceModelAdapter};
use crate::msa::Alignment;
use crate::mutation::{Indel, Mutation};
use crate::sequence::ProteinSequence;
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ScoringStrategy {
    WtMarginals,
    MaskedMarginals,
    PseudoPpl,
    Indel,
}

impl ScoringStrategy {
    /// True for the strategies that score point mutations.
    pub fn scores_point_mutations(&self) -> bool {
        !matches!(self, Self::Indel)
    }

    /// Alignment-aware models only support masked marginals.
    pub fn check_compatible(&self, model: &str, alignment_aware: bool) -> Result<()> {
        if alignment_aware && *self != Self::MaskedMarginals {
            return Err(ScanError::IncompatibleStrategy {
                model: model.to_string(),
                strategy: self.to_string(),
                reason: "alignment-aware models require masked-marginals".to_string(),
            });
        }
        Ok(())
    }

    pub fn check_model(&self, model: &dyn LanguageModel) -> Result<()> {
        self.check_compatible(model.name(), model.kind() == ModelKind::Alignment)
    }
}

/// A strategy ready to score point mutations of one wild-type sequence.
pub trait PointScorer {
    fn score(&self, mutation: &Mutation) -> Result<f32>;
}

/// Log-odds of `mt` over `wt` in one log-probability row.
pub(crate) fn log_odds(
    adapter: &SequenceModelAdapter<'_>,
    row: &[f32],
    mutation: &Mutation,
) -> Result<f32> {
    let wt = adapter.symbol_to_index(mutation.wild_type)? as usize;
    let mt = adapter.symbol_to_index(mutation.mutant)? as usize;
    Ok(row[mt] - row[wt])
}

/// Resolve every label to a sequence index, failing on the first label that
/// disagrees with the sequence.
pub fn locate_all(
    mutations: &[Mutation],
    sequence: &ProteinSequence,
    offset: usize,
) -> Result<Vec<usize>> {
    mutations
        .iter()
        .map(|m| m.locate(sequence, offset))
        .collect()
}

/// Build the scorer for `strategy`. Any pass the strategy shares between
/// mutations is run here.
pub fn point_scorer<'a>(
    adapter: &'a SequenceModelAdapter<'a>,
    strategy: ScoringStrategy,
    sequence: &'a ProteinSequence,
    offset: usize,
    alignment: Option<&Alignment>,
) -> Result<Box<dyn PointScorer + 'a>> {
    strategy.check_model(adapter.model())?;
    Ok(match strategy {
        ScoringStrategy::WtMarginals => Box::new(WtMarginals::new(adapter, sequence, offset)?),
        ScoringStrategy::MaskedMarginals => Box::new(MaskedMarginals::new(
            adapter, sequence, offset, alignment,
        )?),
        ScoringStrategy::PseudoPpl => Box::new(PseudoPpl::new(adapter, sequence, offset)),
        ScoringStrategy::Indel => {
            return Err(ScanError::ConflictingInputs(
                "the indel strategy scores indels, not point mutations".to_string(),
            ))
        }
    })
}

/// Score point mutations in order. All labels are checked against the
/// sequence before the model is run.
pub fn score_mutations(
    adapter: &SequenceModelAdapter<'_>,
    strategy: ScoringStrategy,
    sequence: &ProteinSequence,
    mutations: &[Mutation],
    offset: usize,
    alignment: Option<&Alignment>,
) -> Result<Vec<f32>> {
    locate_all(mutations, sequence, offset)?;
    let scorer = point_scorer(adapter, strategy, sequence, offset, alignment)?;
    mutations.iter().map(|m| scorer.score(m)).collect()
}

/// Score indels in order with the `indel` strategy.
pub fn score_indels(
    adapter: &SequenceModelAdapter<'_>,
    strategy: ScoringStrategy,
    sequence: &ProteinSequence,
    indels: &[Indel],
) -> Result<Vec<f32>> {
    if strategy != ScoringStrategy::Indel {
        return Err(ScanError::ConflictingInputs(format!(
            "indels can only be scored with the indel strategy, not {}",
            strategy
        )));
    }
    strategy.check_model(adapter.model())?;
    let scorer = IndelScorer::new(adapter, sequence)?;
    indels.iter().map(|indel| scorer.score(indel)).collect()
}
