//! The boundary to the pretrained model.
//!
//! A [`LanguageModel`] is a frozen masked language model: token ids in,
//! per-position logits out. [`SequenceModelAdapter`] is what the scoring
//! strategies talk to. It encodes sequences with the model's alphabet,
//! produces masked copies of token tensors and turns logits into
//! log-probabilities, optionally stacking several requests into one model
//! call.
use crate::alphabet::Alphabet;
use crate::error::{Result, ScanError};
use crate::msa::Alignment;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Takes `[batch, tokens]`.
    SingleSequence,
    /// Takes `[batch, rows, tokens]`, e.g. the MSA Transformer.
    Alignment,
}

pub trait LanguageModel {
    /// Name used as the score column header.
    fn name(&self) -> &str;

    fn alphabet(&self) -> &Alphabet;

    fn kind(&self) -> ModelKind {
        ModelKind::SingleSequence
    }

    /// Longest sequence, in residues, the model accepts.
    fn max_sequence_length(&self) -> Option<usize> {
        None
    }

    /// Raw logits over the vocabulary for every token position:
    /// `[B, T] -> [B, T, V]`, or `[B, N, T] -> [B, N, T, V]` for alignment
    /// models. Must not depend on anything but `tokens`.
    fn logits(&self, tokens: &Tensor) -> Result<Tensor>;
}

pub struct SequenceModelAdapter<'m> {
    model: &'m dyn LanguageModel,
    batch_size: usize,
}

impl<'m> SequenceModelAdapter<'m> {
    pub fn new(model: &'m dyn LanguageModel) -> Self {
        Self {
            model,
            batch_size: 1,
        }
    }

    /// Number of requests stacked into one model call by [`Self::forward_rows`].
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model(&self) -> &'m dyn LanguageModel {
        self.model
    }

    pub fn alphabet(&self) -> &'m Alphabet {
        self.model.alphabet()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn symbol_to_index(&self, symbol: char) -> Result<u32> {
        self.alphabet().symbol_to_index(symbol)
    }

    pub fn index_to_symbol(&self, idx: u32) -> Option<&'m str> {
        self.alphabet().index_to_symbol(idx)
    }

    /// Token position of the residue at 0-based sequence index `idx`.
    pub fn token_position(&self, idx: usize) -> usize {
        idx + self.alphabet().residue_offset()
    }

    pub fn check_length(&self, length: usize) -> Result<()> {
        match self.model.max_sequence_length() {
            Some(max) if length > max => {
                Err(ScanError::UnsupportedSequenceLength { length, max })
            }
            _ => Ok(()),
        }
    }

    /// `[1, T]` token ids for one sequence.
    pub fn encode(&self, sequence: &str) -> Result<Tensor> {
        self.check_length(sequence.len())?;
        let ids = self.alphabet().tokenize(sequence)?;
        let len = ids.len();
        Ok(Tensor::from_vec(ids, (1, len), &Device::Cpu)?)
    }

    /// `[1, N, T]` token ids for an alignment, query row first.
    pub fn encode_alignment(&self, alignment: &Alignment) -> Result<Tensor> {
        self.check_length(alignment.width())?;
        let mut ids = Vec::new();
        for row in alignment.rows() {
            ids.extend(self.alphabet().tokenize(row)?);
        }
        let width = ids.len() / alignment.depth();
        Ok(Tensor::from_vec(
            ids,
            (1, alignment.depth(), width),
            &Device::Cpu,
        )?)
    }

    /// Copy of `tokens` with the token at `position` (of the first row for
    /// alignments) replaced by the mask token. `tokens` is left untouched.
    pub fn mask_position(&self, tokens: &Tensor, position: usize) -> Result<Tensor> {
        let dims = tokens.dims();
        let last = dims.len() - 1;
        if position >= dims[last] {
            return Err(candle_core::Error::Msg(format!(
                "cannot mask position {} of {} tokens",
                position, dims[last]
            ))
            .into());
        }
        let mut ranges: Vec<Range<usize>> = vec![0..1; dims.len()];
        ranges[last] = position..position + 1;
        let mask = Tensor::full(
            self.alphabet().mask_idx(),
            vec![1usize; dims.len()],
            tokens.device(),
        )?;
        Ok(tokens.slice_assign(&ranges, &mask)?)
    }

    /// Log-probabilities over the vocabulary for every token position.
    pub fn forward(&self, tokens: &Tensor) -> Result<Tensor> {
        let logits = self.model.logits(tokens)?;
        let log_probs = candle_nn::ops::log_softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?;
        Ok(log_probs.to_device(&Device::Cpu)?)
    }

    /// Run many single-request tensors (leading dimension 1, equal shapes),
    /// `batch_size` of them per model call, keeping only the row at
    /// `positions[i]` of request `i`. Each call's output is dropped before the
    /// next call runs. Rows come back in request order.
    pub fn forward_rows(&self, requests: &[Tensor], positions: &[usize]) -> Result<Vec<Vec<f32>>> {
        if requests.len() != positions.len() {
            return Err(candle_core::Error::Msg(format!(
                "{} requests but {} positions",
                requests.len(),
                positions.len()
            ))
            .into());
        }
        let mut rows = Vec::with_capacity(requests.len());
        for (chunk, chunk_positions) in requests
            .chunks(self.batch_size)
            .zip(positions.chunks(self.batch_size))
        {
            tracing::debug!(
                model = self.model.name(),
                requests = chunk.len(),
                "forward pass"
            );
            let log_probs = self.forward(&Tensor::cat(chunk, 0)?)?;
            for (item, position) in chunk_positions.iter().enumerate() {
                rows.push(self.position_log_probs(&log_probs, item, *position)?);
            }
        }
        Ok(rows)
    }

    /// The log-probability row of batch item `item` at a token position.
    /// For alignment models this is always the first (query) row.
    pub fn position_log_probs(
        &self,
        log_probs: &Tensor,
        item: usize,
        position: usize,
    ) -> Result<Vec<f32>> {
        let row = match log_probs.rank() {
            3 => log_probs.i((item, position))?,
            4 => log_probs.i((item, 0, position))?,
            rank => {
                return Err(candle_core::Error::Msg(format!(
                    "unexpected log-probability tensor of rank {}",
                    rank
                ))
                .into())
            }
        };
        Ok(row.to_vec1::<f32>()?)
    }
}
