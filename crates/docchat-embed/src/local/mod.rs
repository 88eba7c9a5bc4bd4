//! Offline BGE-M3 (XLM-RoBERTa) embeddings with candle.
//!
//! Model files (`tokenizer.json`, `config.json`, `pytorch_model.bin`) are
//! looked up in `APP_MODEL_DIR`, `MODEL_DIR`, then `models/bge-m3`.

mod device;
mod pool;
mod tokenize;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use docchat_core::traits::Embedder;
use docchat_core::ProviderError;
use tokenizers::Tokenizer;
use tracing::info;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub const BGE_M3_DIM: usize = 1024;
const MAX_LEN: usize = 256;

pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
}

impl BgeM3Embedder {
    pub fn new() -> Result<Self> {
        let model_dir = resolve_model_dir()?;
        Self::from_dir(&model_dir)
    }

    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, id: format!("local:bge-m3:d{BGE_M3_DIM}") })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device)?;
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if v.len() != BGE_M3_DIM {
            return Err(anyhow!("unexpected embedding size {}", v.len()));
        }
        Ok(v)
    }
}

impl Embedder for BgeM3Embedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { BGE_M3_DIM }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        texts
            .iter()
            .map(|t| self.embed_one(t).map_err(|e| ProviderError::Fatal(format!("local inference failed: {e}"))))
            .collect()
    }
}

fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                return Ok(p);
            }
        }
    }
    let default = Path::new("models/bge-m3");
    if default.exists() {
        return Ok(default.to_path_buf());
    }
    Err(anyhow!("Could not locate BGE-M3 model directory (set APP_MODEL_DIR)"))
}
