//! T5 model handle backed by candle.
//!
//! The model directory must contain `config.json`, `tokenizer.json` and the weights as either
//! `model.safetensors` or `pytorch_model.bin`.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::config::GenerationConfig;
use crate::error::{ModelLoadError, SummarizeError};
use crate::summarizer::generation::{beam_search, DecoderStep, SpecialTokens};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";

/// Pick the fastest available compute backend
pub fn select_device() -> Result<Device, ModelLoadError> {
    if candle_core::utils::cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else if candle_core::utils::metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else {
        Ok(Device::Cpu)
    }
}

fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

fn require_file(dir: &Path, name: &str) -> Result<PathBuf, ModelLoadError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ModelLoadError::MissingFile(path))
    }
}

/// Loaded weights and tokenizer. Owned by the summarization service for the process lifetime.
pub struct ModelHandle {
    model: t5::T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
    special: SpecialTokens,
}

impl ModelHandle {
    /// Load model and tokenizer from a local directory
    pub fn load(model_dir: &Path) -> Result<Self, ModelLoadError> {
        let device = select_device()?;
        info!("Loading model from: {}", model_dir.display());
        info!("Using device: {}", device_name(&device));

        let config_path = require_file(model_dir, CONFIG_FILE)?;
        let mut config: t5::Config = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;
        // beams are re-run over their full prefix at every step
        config.use_cache = false;

        let tokenizer = Tokenizer::from_file(require_file(model_dir, TOKENIZER_FILE)?)
            .map_err(|e| ModelLoadError::Tokenizer(e.to_string()))?;

        let safetensors = model_dir.join(SAFETENSORS_FILE);
        let vb = if safetensors.is_file() {
            // SAFETY: the weights file is not modified while mapped
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(require_file(model_dir, PYTORCH_FILE)?, DType::F32, &device)?
        };
        let model = t5::T5ForConditionalGeneration::load(vb, &config)?;

        let special = SpecialTokens {
            decoder_start: config
                .decoder_start_token_id
                .unwrap_or(config.pad_token_id) as u32,
            eos: config.eos_token_id as u32,
        };

        info!("Model loaded successfully");
        Ok(Self {
            model,
            tokenizer,
            device,
            special,
        })
    }

    /// Tokenize `text`, keeping at most `max_tokens` ids and always ending on the end token
    fn encode(&self, text: &str, max_tokens: usize) -> Result<Vec<u32>, SummarizeError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| SummarizeError::Generation(e.to_string()))?;
        Ok(truncate_ids(
            encoding.get_ids().to_vec(),
            max_tokens,
            self.special.eos,
        ))
    }

    /// Summarize one prompt with the given decoding parameters
    pub fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String, SummarizeError> {
        let ids = self.encode(prompt, config.max_input_tokens)?;
        debug!("Encoded prompt into {} tokens", ids.len());

        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_output = self.model.encode(&input)?;

        let special = self.special;
        let tokens = {
            let mut step = T5Step {
                model: &mut self.model,
                encoder_output: &encoder_output,
                device: &self.device,
            };
            beam_search(&mut step, special, config)
        };
        self.model.clear_kv_cache();

        self.tokenizer
            .decode(&tokens?, true)
            .map(|s| s.trim().to_string())
            .map_err(|e| SummarizeError::Generation(e.to_string()))
    }
}

/// Truncate token ids to `max`, re-appending `eos` when it was cut off
fn truncate_ids(mut ids: Vec<u32>, max: usize, eos: u32) -> Vec<u32> {
    if max == 0 || ids.len() <= max {
        return ids;
    }
    let ended_with_eos = ids.last() == Some(&eos);
    if ended_with_eos {
        ids.truncate(max - 1);
        ids.push(eos);
    } else {
        ids.truncate(max);
    }
    ids
}

/// One batched decoder pass over all live beams
struct T5Step<'a> {
    model: &'a mut t5::T5ForConditionalGeneration,
    encoder_output: &'a Tensor,
    device: &'a Device,
}

impl DecoderStep for T5Step<'_> {
    fn next_logits(&mut self, prefixes: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, SummarizeError> {
        let batch = prefixes.len();
        let len = prefixes.first().map(|p| p.len()).unwrap_or(0);
        let flat: Vec<u32> = prefixes.iter().flatten().copied().collect();

        let decoder_input = Tensor::from_vec(flat, (batch, len), self.device)?;
        let encoder_output = self.encoder_output.repeat((batch, 1, 1))?;
        let logits = self.model.decode(&decoder_input, &encoder_output)?;

        Ok(logits.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}
