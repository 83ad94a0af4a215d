use super::PointScorer;
use crate::error::Result;
use crate::model::SequenceModelAdapter;
use crate::mutation::{Indel, Mutation};
use crate::sequence::ProteinSequence;
use candle_core::Tensor;

/// Sum over residues of the log-probability of the residue when it alone is
/// masked. One forward pass per residue.
pub fn pseudo_log_likelihood(adapter: &SequenceModelAdapter<'_>, sequence: &str) -> Result<f32> {
    let tokens = adapter.encode(sequence)?;
    let positions: Vec<usize> = (0..sequence.len())
        .map(|idx| adapter.token_position(idx))
        .collect();
    let requests = positions
        .iter()
        .map(|pos| adapter.mask_position(&tokens, *pos))
        .collect::<Result<Vec<Tensor>>>()?;
    let rows = adapter.forward_rows(&requests, &positions)?;

    let mut total = 0.0f32;
    for (symbol, row) in sequence.chars().zip(rows) {
        total += row[adapter.symbol_to_index(symbol)? as usize];
    }
    Ok(total)
}

/// Pseudo-log-likelihood of each mutated sequence.
pub struct PseudoPpl<'a> {
    adapter: &'a SequenceModelAdapter<'a>,
    sequence: &'a ProteinSequence,
    offset: usize,
}

impl<'a> PseudoPpl<'a> {
    pub fn new(
        adapter: &'a SequenceModelAdapter<'a>,
        sequence: &'a ProteinSequence,
        offset: usize,
    ) -> Self {
        tracing::info!(
            model = adapter.model().name(),
            passes_per_mutation = sequence.len(),
            "pseudo-perplexity"
        );
        Self {
            adapter,
            sequence,
            offset,
        }
    }
}

impl PointScorer for PseudoPpl<'_> {
    fn score(&self, mutation: &Mutation) -> Result<f32> {
        let idx = mutation.locate(self.sequence, self.offset)?;
        let mutated = self.sequence.substitute(idx, mutation.mutant);
        pseudo_log_likelihood(self.adapter, &mutated)
    }
}

/// Indel scores relative to the wild type's pseudo-log-likelihood, which is
/// computed once.
pub struct IndelScorer<'a> {
    adapter: &'a SequenceModelAdapter<'a>,
    wild_type_pll: f32,
}

impl<'a> IndelScorer<'a> {
    pub fn new(adapter: &'a SequenceModelAdapter<'a>, sequence: &ProteinSequence) -> Result<Self> {
        let wild_type_pll = pseudo_log_likelihood(adapter, sequence.as_str())?;
        tracing::debug!(wild_type_pll, "wild-type pseudo-log-likelihood");
        Ok(Self {
            adapter,
            wild_type_pll,
        })
    }

    pub fn wild_type_pll(&self) -> f32 {
        self.wild_type_pll
    }

    pub fn score(&self, indel: &Indel) -> Result<f32> {
        Ok(pseudo_log_likelihood(self.adapter, &indel.sequence)? - self.wild_type_pll)
    }
}
