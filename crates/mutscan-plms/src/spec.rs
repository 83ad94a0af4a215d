use crate::amplify::{AmplifyModels, AmplifyRunner};
use crate::esm::{ESM2Models, MsaOnnxModel, OnnxModel};
use anyhow::{anyhow, Result};
use candle_core::Device;
use mutscan_core::LanguageModel;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use strum::IntoEnumIterator;

/// A model reference as given on the command line.
///
/// Hub models go by name (`amplify-120m`, `esm2-t6-8m`, ...); local ONNX
/// exports are written `onnx:<path>` or, for alignment-aware models,
/// `msa-onnx:<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    Amplify(AmplifyModels),
    Esm2(ESM2Models),
    Onnx(PathBuf),
    MsaOnnx(PathBuf),
}

impl ModelSpec {
    /// Known without loading, so configuration errors surface before any
    /// download.
    pub fn is_alignment_aware(&self) -> bool {
        matches!(self, ModelSpec::MsaOnnx(_))
    }

    pub fn load(&self, device: &Device) -> Result<Box<dyn LanguageModel>> {
        tracing::info!(model = %self, "loading model");
        Ok(match self {
            ModelSpec::Amplify(model) => {
                Box::new(AmplifyRunner::load_model(*model, device.clone())?)
            }
            ModelSpec::Esm2(model) => Box::new(OnnxModel::load(*model)?),
            ModelSpec::Onnx(path) => Box::new(OnnxModel::from_file(self.to_string(), path)?),
            ModelSpec::MsaOnnx(path) => {
                Box::new(MsaOnnxModel::from_file(self.to_string(), path)?)
            }
        })
    }

    /// Every hub model name.
    pub fn hub_names() -> Vec<String> {
        AmplifyModels::iter()
            .map(|m| m.to_string())
            .chain(ESM2Models::iter().map(|m| m.to_string()))
            .collect()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Amplify(model) => write!(f, "{}", model),
            ModelSpec::Esm2(model) => write!(f, "{}", model),
            ModelSpec::Onnx(path) => write!(f, "onnx:{}", path.display()),
            ModelSpec::MsaOnnx(path) => write!(f, "msa-onnx:{}", path.display()),
        }
    }
}

impl FromStr for ModelSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("msa-onnx:") {
            return Ok(ModelSpec::MsaOnnx(PathBuf::from(path)));
        }
        if let Some(path) = s.strip_prefix("onnx:") {
            return Ok(ModelSpec::Onnx(PathBuf::from(path)));
        }
        let name = s.to_ascii_lowercase();
        if let Ok(model) = AmplifyModels::from_str(&name) {
            return Ok(ModelSpec::Amplify(model));
        }
        if let Ok(model) = ESM2Models::from_str(&name) {
            return Ok(ModelSpec::Esm2(model));
        }
        Err(anyhow!(
            "unknown model '{}'; expected one of {}, onnx:<path> or msa-onnx:<path>",
            s,
            Self::hub_names().join(", ")
        ))
    }
}
