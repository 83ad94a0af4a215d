//! ESM-family models exported to ONNX, run with ONNX Runtime.
//!
//! ESM-2 checkpoints converted to ONNX are fetched from the HuggingFace hub.
//! Local exports are supported too, both single-sequence models (inputs
//! `input_ids` and `attention_mask`) and the alignment-aware MSA Transformer
//! (input `tokens` of shape `[batch, rows, seq]`). Every export must produce
//! a `logits` output over the ESM vocabulary.
//!
//! # Models:
//! * ESM2_T6_8M - small 6-layer protein language model
//! * ESM2_T12_35M - medium 12-layer protein language model
//! * ESM2_T30_150M - large 30-layer protein language model
//!
use anyhow::{bail, Result};
use candle_core::{Device, Tensor};
use hf_hub::api::sync::Api;
use mutscan_core::{Alphabet, LanguageModel, ModelKind, ScanError};
use ndarray::{Array2, Array3, ArrayViewD};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use std::path::Path;
use strum::{Display, EnumIter, EnumString};

/// Longest sequence the ESM models were trained on, excluding `<cls>`/`<eos>`.
pub const ESM_MAX_RESIDUES: usize = 1022;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum ESM2Models {
    #[strum(serialize = "esm2-t6-8m")]
    ESM2_T6_8M,
    #[strum(serialize = "esm2-t12-35m")]
    ESM2_T12_35M,
    #[strum(serialize = "esm2-t30-150m")]
    ESM2_T30_150M,
}

impl ESM2Models {
    pub fn repo_id(&self) -> &'static str {
        match self {
            ESM2Models::ESM2_T6_8M => "zcpbx/esm2-t6-8m-UR50D-onnx",
            ESM2Models::ESM2_T12_35M => "zcpbx/esm2-t12-35M-UR50D-onnx",
            ESM2Models::ESM2_T30_150M => "zcpbx/esm2-t30-150M-UR50D-onnx",
        }
    }
}

fn create_session(model_path: &Path) -> Result<Session> {
    if !model_path.is_file() {
        bail!("ONNX model {} not found", model_path.display());
    }
    ort::init()
        .with_name("mutscan")
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .commit()?;
    tracing::debug!(path = %model_path.display(), "creating ONNX session");
    Ok(Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level1)?
        .with_intra_threads(1)?
        .commit_from_file(model_path)?)
}

fn to_tensor(logits: ArrayViewD<'_, f32>) -> mutscan_core::Result<Tensor> {
    let shape = logits.shape().to_vec();
    let data: Vec<f32> = logits.iter().copied().collect();
    Ok(Tensor::from_vec(data, shape, &Device::Cpu)?)
}

/// A single-sequence ESM model.
pub struct OnnxModel {
    name: String,
    session: Session,
    alphabet: Alphabet,
}

impl OnnxModel {
    pub fn load(model: ESM2Models) -> Result<Self> {
        tracing::info!(repo = model.repo_id(), "fetching ONNX model");
        let model_path = Api::new()?.model(model.repo_id().to_string()).get("model.onnx")?;
        Self::from_file(model.to_string(), &model_path)
    }

    pub fn from_file(name: String, model_path: &Path) -> Result<Self> {
        Ok(Self {
            name,
            session: create_session(model_path)?,
            alphabet: Alphabet::esm1b(),
        })
    }
}

impl LanguageModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(ESM_MAX_RESIDUES)
    }

    fn logits(&self, tokens: &Tensor) -> mutscan_core::Result<Tensor> {
        let (batch, len) = tokens.dims2()?;
        let ids: Vec<i64> = tokens
            .flatten_all()?
            .to_vec1::<u32>()?
            .into_iter()
            .map(i64::from)
            .collect();
        let tokens_array = Array2::from_shape_vec((batch, len), ids).map_err(ScanError::backend)?;
        let mask_array: Array2<i64> = Array2::ones((batch, len));
        let outputs = self
            .session
            .run(
                ort::inputs!["input_ids" => tokens_array, "attention_mask" => mask_array]
                    .map_err(ScanError::backend)?,
            )
            .map_err(ScanError::backend)?;
        let logits = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(ScanError::backend)?;
        to_tensor(logits)
    }
}

/// An alignment-aware model such as the MSA Transformer.
pub struct MsaOnnxModel {
    name: String,
    session: Session,
    alphabet: Alphabet,
}

impl MsaOnnxModel {
    pub fn from_file(name: String, model_path: &Path) -> Result<Self> {
        Ok(Self {
            name,
            session: create_session(model_path)?,
            alphabet: Alphabet::msa_transformer(),
        })
    }
}

impl LanguageModel for MsaOnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Alignment
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(ESM_MAX_RESIDUES)
    }

    fn logits(&self, tokens: &Tensor) -> mutscan_core::Result<Tensor> {
        let (batch, rows, len) = tokens.dims3()?;
        let ids: Vec<i64> = tokens
            .flatten_all()?
            .to_vec1::<u32>()?
            .into_iter()
            .map(i64::from)
            .collect();
        let tokens_array =
            Array3::from_shape_vec((batch, rows, len), ids).map_err(ScanError::backend)?;
        let outputs = self
            .session
            .run(ort::inputs!["tokens" => tokens_array].map_err(ScanError::backend)?)
            .map_err(ScanError::backend)?;
        let logits = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(ScanError::backend)?;
        to_tensor(logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_model_names() {
        assert_eq!(
            ESM2Models::from_str("esm2-t12-35m").unwrap(),
            ESM2Models::ESM2_T12_35M
        );
        assert_eq!(ESM2Models::ESM2_T6_8M.to_string(), "esm2-t6-8m");
        assert!(ESM2Models::from_str("esm2-t33-650m").is_err());
    }

    #[test]
    fn test_logits_tensor_from_array() -> mutscan_core::Result<()> {
        let array =
            ndarray::Array3::<f32>::from_shape_fn((1, 2, 3), |(_, i, j)| (i * 3 + j) as f32);
        let tensor = to_tensor(array.view().into_dyn())?;
        assert_eq!(tensor.dims(), &[1, 2, 3]);
        assert_eq!(
            tensor.to_vec3::<f32>()?,
            vec![vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]]
        );
        Ok(())
    }
}
