use super::{log_odds, PointScorer};
use crate::error::{Result, ScanError};
use crate::model::{ModelKind, SequenceModelAdapter};
use crate::msa::Alignment;
use crate::mutation::Mutation;
use crate::sequence::ProteinSequence;
use candle_core::{IndexOp, Tensor};

/// Wild-type marginals: one unmasked forward pass over the wild type.
pub struct WtMarginals<'a> {
    adapter: &'a SequenceModelAdapter<'a>,
    sequence: &'a ProteinSequence,
    offset: usize,
    /// Log-probability rows indexed by token position.
    rows: Vec<Vec<f32>>,
}

impl<'a> WtMarginals<'a> {
    pub fn new(
        adapter: &'a SequenceModelAdapter<'a>,
        sequence: &'a ProteinSequence,
        offset: usize,
    ) -> Result<Self> {
        tracing::info!(model = adapter.model().name(), "wild-type marginals: 1 forward pass");
        let tokens = adapter.encode(sequence.as_str())?;
        let log_probs = adapter.forward(&tokens)?;
        let rows = log_probs.i(0)?.to_vec2::<f32>()?;
        Ok(Self {
            adapter,
            sequence,
            offset,
            rows,
        })
    }
}

impl PointScorer for WtMarginals<'_> {
    fn score(&self, mutation: &Mutation) -> Result<f32> {
        let idx = mutation.locate(self.sequence, self.offset)?;
        log_odds(
            self.adapter,
            &self.rows[self.adapter.token_position(idx)],
            mutation,
        )
    }
}

/// Masked marginals: one masked pass per residue, run once and cached.
pub struct MaskedMarginals<'a> {
    adapter: &'a SequenceModelAdapter<'a>,
    sequence: &'a ProteinSequence,
    offset: usize,
    /// Log-probability row of each masked residue, indexed by sequence index.
    rows: Vec<Vec<f32>>,
}

impl<'a> MaskedMarginals<'a> {
    /// Alignment-aware models need `alignment`, whose query must be the
    /// wild type; only the query row is read back.
    pub fn new(
        adapter: &'a SequenceModelAdapter<'a>,
        sequence: &'a ProteinSequence,
        offset: usize,
        alignment: Option<&Alignment>,
    ) -> Result<Self> {
        let model = adapter.model();
        let base = match (model.kind(), alignment) {
            (ModelKind::SingleSequence, _) => adapter.encode(sequence.as_str())?,
            (ModelKind::Alignment, Some(alignment)) => {
                if alignment.query() != sequence.as_str() {
                    return Err(ScanError::ConflictingInputs(
                        "the first alignment row must be the wild-type sequence".to_string(),
                    ));
                }
                adapter.encode_alignment(alignment)?
            }
            (ModelKind::Alignment, None) => {
                return Err(ScanError::MissingAlignment(format!(
                    "model '{}' scores aligned sequences",
                    model.name()
                )))
            }
        };
        tracing::info!(
            model = model.name(),
            passes = sequence.len(),
            "masked marginals"
        );
        let positions: Vec<usize> = (0..sequence.len())
            .map(|idx| adapter.token_position(idx))
            .collect();
        let requests = positions
            .iter()
            .map(|pos| adapter.mask_position(&base, *pos))
            .collect::<Result<Vec<Tensor>>>()?;
        let rows = adapter.forward_rows(&requests, &positions)?;
        Ok(Self {
            adapter,
            sequence,
            offset,
            rows,
        })
    }
}

impl PointScorer for MaskedMarginals<'_> {
    fn score(&self, mutation: &Mutation) -> Result<f32> {
        let idx = mutation.locate(self.sequence, self.offset)?;
        log_odds(self.adapter, &self.rows[idx], mutation)
    }
}
