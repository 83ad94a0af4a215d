//! AMPLIFY
//!
//! The AMPLIFY protein language model, run with candle.
//!
//! - [GH Amplify Code](https://github.com/chandar-lab/AMPLIFY)
//! - [HF - 120M Model ](https://huggingface.co/chandar-lab/AMPLIFY_120M)
//! - [Paper](https://www.biorxiv.org/content/10.1101/2024.09.23.614603v1)
//!
pub mod config;
mod encoder;
pub mod model;
mod rotary;

use anyhow::{Error as E, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use config::AMPLIFYConfig;
use hf_hub::{api::sync::Api, Repo, RepoType};
use model::AMPLIFY;
use mutscan_core::{Alphabet, LanguageModel, ScanError, SpecialTokens};
use strum::{Display, EnumIter, EnumString};
use tokenizers::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum AmplifyModels {
    #[strum(serialize = "amplify-120m")]
    AMP120M,
    #[strum(serialize = "amplify-350m")]
    AMP350M,
}

impl AmplifyModels {
    pub fn repo(&self) -> (&'static str, &'static str) {
        match self {
            AmplifyModels::AMP120M => ("chandar-lab/AMPLIFY_120M", "main"),
            AmplifyModels::AMP350M => ("chandar-lab/AMPLIFY_350M", "main"),
        }
    }
}

/// Build an [`Alphabet`] from the vocabulary of an AMPLIFY `tokenizer.json`.
pub fn alphabet_from_tokenizer(tokenizer: &Tokenizer) -> Result<Alphabet> {
    let vocab = tokenizer.get_vocab(true);
    let size = vocab.values().max().map_or(0, |max| *max as usize + 1);
    let mut tokens: Vec<String> = (0..size).map(|i| format!("<unused_{}>", i)).collect();
    for (token, id) in vocab {
        tokens[id as usize] = token;
    }
    let special = SpecialTokens {
        bos: "<bos>",
        eos: "<eos>",
        mask: "<mask>",
        pad: "<pad>",
        unk: "<unk>",
    };
    Ok(Alphabet::new(tokens, special, true, true)?)
}

pub struct AmplifyRunner {
    name: String,
    model: AMPLIFY,
    alphabet: Alphabet,
}

impl AmplifyRunner {
    pub fn load_model(modeltype: AmplifyModels, device: Device) -> Result<AmplifyRunner> {
        let (model_id, revision) = modeltype.repo();
        tracing::info!(model = model_id, "fetching AMPLIFY weights");
        let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, revision.to_string());
        let (config_filename, tokenizer_filename, weights_filename) = {
            let api = Api::new()?;
            let api = api.repo(repo);
            let config = api.get("config.json")?;
            let tokenizer = api.get("tokenizer.json")?;
            let weights = api.get("model.safetensors")?;
            (config, tokenizer, weights)
        };
        let config: AMPLIFYConfig =
            serde_json::from_str(&std::fs::read_to_string(config_filename)?)?;
        let tokenizer = Tokenizer::from_file(tokenizer_filename).map_err(E::msg)?;
        let alphabet = alphabet_from_tokenizer(&tokenizer)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_filename], DType::F32, &device)?
        };
        let model = AMPLIFY::load(vb, &config)?;
        Ok(AmplifyRunner {
            name: modeltype.to_string(),
            model,
            alphabet,
        })
    }
}

impl LanguageModel for AmplifyRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.model.config().max_residues())
    }

    fn logits(&self, tokens: &Tensor) -> mutscan_core::Result<Tensor> {
        let tokens = tokens.to_device(self.model.get_device())?;
        self.model.forward(&tokens).map_err(ScanError::from)
    }
}
