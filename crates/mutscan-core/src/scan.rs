//! One scoring run: a sequence, what to score, how, and with which models.
use crate::assemble::{ScanResult, ScoreMatrix, ScoreTable};
use crate::error::{Result, ScanError};
use crate::model::{LanguageModel, ModelKind, SequenceModelAdapter};
use crate::msa::Alignment;
use crate::mutation::MutationInput;
use crate::scoring::{locate_all, score_indels, score_mutations, ScoringStrategy};
use crate::sequence::ProteinSequence;
use bon::Builder;

#[derive(Debug, Clone, Builder)]
pub struct ScanConfig {
    pub sequence: ProteinSequence,
    #[builder(default = MutationInput::ExhaustiveScan)]
    pub input: MutationInput,
    #[builder(default = ScoringStrategy::WtMarginals)]
    pub strategy: ScoringStrategy,
    /// Label position of the first residue.
    #[builder(default = 1)]
    pub offset: usize,
    /// Requests per model call.
    #[builder(default = 1)]
    pub batch_size: usize,
    /// Needed by alignment-aware models; its query must be `sequence`.
    pub alignment: Option<Alignment>,
}

impl ScanConfig {
    /// Checks that need no model: the input matches the strategy and every
    /// mutation label agrees with the sequence.
    pub fn validate(&self) -> Result<()> {
        let indel_input = matches!(self.input, MutationInput::UserIndels(_));
        if indel_input != (self.strategy == ScoringStrategy::Indel) {
            return Err(ScanError::ConflictingInputs(format!(
                "the {} strategy cannot score {}",
                self.strategy,
                if indel_input {
                    "indels"
                } else {
                    "point mutations"
                }
            )));
        }
        if self.offset == 0 {
            return Err(ScanError::ConflictingInputs(
                "the position offset must be at least 1".to_string(),
            ));
        }
        if let Some(alignment) = &self.alignment {
            if alignment.query() != self.sequence.as_str() {
                return Err(ScanError::ConflictingInputs(
                    "the first alignment row must be the wild-type sequence".to_string(),
                ));
            }
        }
        locate_all(
            &self.input.mutations(&self.sequence, self.offset),
            &self.sequence,
            self.offset,
        )?;
        if self.strategy == ScoringStrategy::PseudoPpl && self.input.is_exhaustive() {
            tracing::warn!(
                passes = self.sequence.len() * self.sequence.len() * 20,
                "pseudo-ppl on an exhaustive scan runs one pass per residue for every mutation"
            );
        }
        Ok(())
    }

    /// Checks for one model, known before it is loaded.
    pub fn check_model(&self, name: &str, alignment_aware: bool) -> Result<()> {
        self.strategy.check_compatible(name, alignment_aware)?;
        if alignment_aware && self.alignment.is_none() {
            return Err(ScanError::MissingAlignment(format!(
                "model '{}' scores aligned sequences; pass an alignment",
                name
            )));
        }
        Ok(())
    }

    /// Checks for a whole ensemble, given as `(name, alignment_aware)` pairs.
    /// Names become column headers and must be distinct.
    pub fn check_models(&self, models: &[(&str, bool)]) -> Result<()> {
        for (i, (name, alignment_aware)) in models.iter().enumerate() {
            if models[..i].iter().any(|(seen, _)| seen == name) {
                return Err(ScanError::ConflictingInputs(format!(
                    "model '{}' is listed more than once",
                    name
                )));
            }
            self.check_model(name, *alignment_aware)?;
        }
        Ok(())
    }

    /// Row labels of the score table, in scoring order.
    pub fn labels(&self) -> Vec<String> {
        self.input.labels(&self.sequence, self.offset)
    }

    /// One score per label for one model.
    pub fn score_model(&self, model: &dyn LanguageModel) -> Result<Vec<f32>> {
        self.check_model(model.name(), model.kind() == ModelKind::Alignment)?;
        tracing::info!(
            model = model.name(),
            strategy = %self.strategy,
            "scoring"
        );
        let adapter = SequenceModelAdapter::new(model).with_batch_size(self.batch_size);
        match &self.input {
            MutationInput::UserIndels(indels) => {
                score_indels(&adapter, self.strategy, &self.sequence, indels)
            }
            input => {
                let mutations = input.mutations(&self.sequence, self.offset);
                score_mutations(
                    &adapter,
                    self.strategy,
                    &self.sequence,
                    &mutations,
                    self.offset,
                    self.alignment.as_ref(),
                )
            }
        }
    }

    /// Build the table from per-model score columns and, for exhaustive
    /// scans, the matrix of the first column.
    pub fn assemble(&self, columns: Vec<(String, Vec<f32>)>) -> Result<ScanResult> {
        let mut table = ScoreTable::new(self.labels());
        for (name, scores) in columns {
            table.add_column(name, scores)?;
        }
        let matrix = match (self.input.is_exhaustive(), table.column_names().next()) {
            (true, Some(first)) => Some(ScoreMatrix::from_table(
                &table,
                first,
                &self.sequence,
                self.offset,
            )?),
            _ => None,
        };
        Ok(ScanResult { table, matrix })
    }

    /// Validate, score with every model and assemble.
    pub fn run(&self, models: &[&dyn LanguageModel]) -> Result<ScanResult> {
        self.validate()?;
        let ensemble: Vec<(&str, bool)> = models
            .iter()
            .map(|m| (m.name(), m.kind() == ModelKind::Alignment))
            .collect();
        self.check_models(&ensemble)?;
        let mut columns = Vec::with_capacity(models.len());
        for model in models {
            columns.push((model.name().to_string(), self.score_model(*model)?));
        }
        self.assemble(columns)
    }
}
