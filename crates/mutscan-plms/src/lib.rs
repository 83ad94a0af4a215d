//! mutscan-plms
//!
//! Pretrained protein language models behind the
//! [`mutscan_core::LanguageModel`] trait:
//!
//! - AMPLIFY, run natively with candle
//! - ESM-2 ONNX exports from the HuggingFace hub, run with ONNX Runtime
//! - local ONNX exports of ESM models and of the MSA Transformer
//!
//! Models are named with a [`ModelSpec`].
//!
//! ```shell
//! cargo run -p mutscan-cli -- scan --sequence MKTAYIAKQR --model-location amplify-120m
//! cargo run -p mutscan-cli --features metal -- scan --sequence MKTAYIAKQR --model-location amplify-120m
//! ```
use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::{Device, Result};

pub mod amplify;
pub mod esm;
mod spec;

pub use amplify::{AmplifyModels, AmplifyRunner};
pub use esm::{ESM2Models, MsaOnnxModel, OnnxModel};
pub use spec::ModelSpec;

pub fn device(cpu: bool) -> Result<Device> {
    if cpu {
        Ok(Device::Cpu)
    } else if cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            tracing::info!(
                "Running on CPU, to run on GPU(metal), build with `--features metal`"
            );
        }
        #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
        {
            tracing::info!("Running on CPU, to run on GPU, build with `--features cuda`");
        }
        Ok(Device::Cpu)
    }
}
