use std::fs;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use serde::Deserialize;
use tokenizers::{PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{EmbeddingError, Result};

/// Dimensions read straight from `config.json`, independent of candle's
/// `Config` field visibility.
#[derive(Debug, Deserialize)]
struct ModelDims {
    hidden_size: usize,
    max_position_embeddings: usize,
}

/// The subset of `tokenizer_config.json` that affects truncation.
///
/// `model_max_length` is a float because checkpoints without a limit store
/// a sentinel like `1e30`.
#[derive(Debug, Default, Deserialize)]
struct TokenizerSettings {
    model_max_length: Option<f64>,
}

/// Model manager handles loading and inference with the pretrained encoder.
///
/// Loaded once and read-only afterwards, so a shared reference can run
/// inference from any thread without locking.
pub struct ModelManager {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    max_length: usize,
}

impl ModelManager {
    /// Load from a directory containing `config.json`, `tokenizer.json` and
    /// `model.safetensors`. `tokenizer_config.json` is optional.
    pub fn load_from_dir(model_dir: &Path) -> Result<Self> {
        let config_json = read_string(&model_dir.join("config.json"))?;
        let tokenizer_json = read_string(&model_dir.join("tokenizer.json"))?;

        let settings_path = model_dir.join("tokenizer_config.json");
        let settings_json = if settings_path.exists() {
            Some(read_string(&settings_path)?)
        } else {
            None
        };

        let weights_path = model_dir.join("model.safetensors");
        let weights = fs::read(&weights_path).map_err(|source| EmbeddingError::Io {
            path: weights_path.clone(),
            source,
        })?;

        Self::load(&config_json, &tokenizer_json, settings_json.as_deref(), weights)
    }

    /// Initialize the model from in-memory files.
    ///
    /// # Arguments
    /// * `config_json` - Contents of `config.json`
    /// * `tokenizer_json` - Contents of `tokenizer.json`
    /// * `tokenizer_config_json` - Contents of `tokenizer_config.json`, if the checkpoint ships one
    /// * `model_weights` - Model weights in safetensors format
    pub fn load(
        config_json: &str,
        tokenizer_json: &str,
        tokenizer_config_json: Option<&str>,
        model_weights: Vec<u8>,
    ) -> Result<Self> {
        // CPU only; the service never moves tensors between devices
        let device = Device::Cpu;

        let config: Config = serde_json::from_str(config_json)
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        let dims: ModelDims = serde_json::from_str(config_json)
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        let settings: TokenizerSettings = match tokenizer_config_json {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?,
            None => TokenizerSettings::default(),
        };
        let max_length = resolve_max_length(settings.model_max_length, dims.max_position_embeddings);

        let mut tokenizer = Tokenizer::from_bytes(tokenizer_json.as_bytes())
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        configure_tokenizer(&mut tokenizer, max_length)?;

        let vb = VarBuilder::from_buffered_safetensors(model_weights, DType::F32, &device)?;
        let model = BertModel::load(vb, &config)?;

        tracing::debug!(
            hidden_size = dims.hidden_size,
            max_length,
            "Encoder weights loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            hidden_size: dims.hidden_size,
            max_length,
        })
    }

    /// Width of every embedding this model produces.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Token budget per text; anything past it is truncated.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encode multiple texts in one forward pass.
    ///
    /// The batch is tokenized jointly, so every text is padded to the longest
    /// one. Returns one vector per text in input order.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;

        let mut all_token_ids = Vec::with_capacity(encodings.len());
        let mut all_type_ids = Vec::with_capacity(encodings.len());
        let mut all_masks = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            all_token_ids.push(encoding.get_ids().to_vec());
            all_type_ids.push(encoding.get_type_ids().to_vec());
            all_masks.push(encoding.get_attention_mask().to_vec());
        }

        let token_ids = Tensor::new(all_token_ids, &self.device)?;
        let token_type_ids = Tensor::new(all_type_ids, &self.device)?;
        let attention_mask = Tensor::new(all_masks, &self.device)?;

        // [batch, seq_len, hidden]
        let output = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = mean_pool(&output)?;
        Ok(pooled.to_vec2::<f32>()?)
    }
}

/// Mean pooling: the arithmetic mean of every token's hidden state.
///
/// All positions count, including padding added to align the batch, so a
/// text's vector depends on the longest text it was batched with.
pub(crate) fn mean_pool(token_embeddings: &Tensor) -> Result<Tensor> {
    Ok(token_embeddings.mean(1)?)
}

/// Pick the truncation length: the tokenizer's declared limit, never past
/// the position table.
pub(crate) fn resolve_max_length(model_max_length: Option<f64>, max_positions: usize) -> usize {
    match model_max_length {
        Some(limit) if limit.is_finite() && limit >= 1.0 && limit < max_positions as f64 => {
            limit as usize
        }
        _ => max_positions,
    }
}

/// Pad jointly to the longest sequence in each batch and truncate at
/// `max_length`.
///
/// Checkpoints often ship a fixed padding strategy in `tokenizer.json`. Only
/// the strategy is replaced; the pad token and id the tokenizer declares are
/// kept.
pub(crate) fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    let mut padding = tokenizer.get_padding().cloned().unwrap_or_default();
    padding.strategy = PaddingStrategy::BatchLongest;
    tokenizer.with_padding(Some(padding));

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

    Ok(())
}

fn read_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| EmbeddingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal word-level tokenizer with a fixed padding strategy, like the
    /// ones published alongside sentence-transformers checkpoints.
    const TINY_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": {
            "strategy": { "Fixed": 128 },
            "direction": "Right",
            "pad_to_multiple_of": null,
            "pad_id": 0,
            "pad_type_id": 0,
            "pad_token": "[PAD]"
        },
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[PAD]": 0, "[UNK]": 1, "hello": 2, "world": 3, "again": 4 },
            "unk_token": "[UNK]"
        }
    }"#;

    fn tiny_tokenizer(max_length: usize) -> Tokenizer {
        let mut tokenizer = Tokenizer::from_bytes(TINY_TOKENIZER.as_bytes()).unwrap();
        configure_tokenizer(&mut tokenizer, max_length).unwrap();
        tokenizer
    }

    #[test]
    fn test_batch_padded_to_longest() {
        let tokenizer = tiny_tokenizer(16);
        let encodings = tokenizer
            .encode_batch(vec!["hello", "hello world again"], true)
            .unwrap();

        assert_eq!(encodings[0].get_ids(), &[2, 0, 0]);
        assert_eq!(encodings[0].get_attention_mask(), &[1, 0, 0]);
        assert_eq!(encodings[1].get_ids(), &[2, 3, 4]);
        assert_eq!(encodings[1].get_attention_mask(), &[1, 1, 1]);
    }

    #[test]
    fn test_truncation_drops_excess_tokens() {
        let tokenizer = tiny_tokenizer(2);
        let encodings = tokenizer
            .encode_batch(vec!["hello world again"], true)
            .unwrap();

        assert_eq!(encodings[0].get_ids(), &[2, 3]);
    }

    #[test]
    fn test_resolve_max_length() {
        assert_eq!(resolve_max_length(Some(256.0), 512), 256);
        // Sentinel for "no limit"
        assert_eq!(resolve_max_length(Some(1e30), 512), 512);
        assert_eq!(resolve_max_length(Some(8192.0), 512), 512);
        assert_eq!(resolve_max_length(None, 512), 512);
        assert_eq!(resolve_max_length(Some(0.0), 512), 512);
    }

    #[test]
    fn test_mean_pool_averages_token_axis() {
        let hidden = Tensor::new(
            &[
                [[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]],
                [[0.0f32, 0.0], [0.0, 0.0], [6.0, 3.0]],
            ],
            &Device::Cpu,
        )
        .unwrap();

        let pooled = mean_pool(&hidden).unwrap().to_vec2::<f32>().unwrap();

        assert_eq!(pooled, vec![vec![3.0, 4.0], vec![2.0, 1.0]]);
    }

    /// BERT shape small enough to build with random weights in a unit test.
    const TINY_BERT_CONFIG: &str = r#"{
        "vocab_size": 5,
        "hidden_size": 8,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "max_position_embeddings": 16,
        "type_vocab_size": 2,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": 0,
        "position_embedding_type": "absolute",
        "use_cache": true,
        "classifier_dropout": null,
        "model_type": "bert"
    }"#;

    /// Randomly initialized weights for `TINY_BERT_CONFIG`, serialized the
    /// way checkpoints ship them.
    fn tiny_bert_weights(dir: &Path) -> Vec<u8> {
        let config: Config = serde_json::from_str(TINY_BERT_CONFIG).unwrap();
        let varmap = candle_nn::VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BertModel::load(vb, &config).unwrap();

        let path = dir.join("model.safetensors");
        varmap.save(&path).unwrap();
        fs::read(&path).unwrap()
    }

    #[test]
    fn test_encode_batch_runs_the_encoder() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let weights = tiny_bert_weights(temp_dir.path());
        let model = ModelManager::load(TINY_BERT_CONFIG, TINY_TOKENIZER, None, weights).unwrap();

        assert_eq!(model.hidden_size(), 8);
        assert_eq!(model.max_length(), 16);

        let texts: Vec<String> = ["hello", "hello world again", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let embeddings = model.encode_batch(&texts).unwrap();

        assert_eq!(embeddings.len(), 3, "one vector per input");
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 8);
            assert!(embedding.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_encode_batch_truncates_past_position_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let weights = tiny_bert_weights(temp_dir.path());
        let model = ModelManager::load(TINY_BERT_CONFIG, TINY_TOKENIZER, None, weights).unwrap();

        // 100 tokens against a 16-entry position table
        let long_text = "hello ".repeat(100);
        let embeddings = model.encode_batch(&[long_text]).unwrap();

        assert_eq!(embeddings.len(), 1);
        assert_eq!(embeddings[0].len(), 8);
    }

    #[test]
    fn test_load_from_dir_reads_tokenizer_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        tiny_bert_weights(temp_dir.path());
        fs::write(temp_dir.path().join("config.json"), TINY_BERT_CONFIG).unwrap();
        fs::write(temp_dir.path().join("tokenizer.json"), TINY_TOKENIZER).unwrap();
        fs::write(
            temp_dir.path().join("tokenizer_config.json"),
            r#"{ "model_max_length": 4 }"#,
        )
        .unwrap();

        let model = ModelManager::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(model.max_length(), 4);

        let embeddings = model
            .encode_batch(&["hello world again hello world".to_string()])
            .unwrap();
        assert_eq!(embeddings[0].len(), 8);
    }

    #[test]
    fn test_load_from_dir_missing_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let err = ModelManager::load_from_dir(temp_dir.path())
            .err()
            .expect("empty directory should not load");

        match err {
            EmbeddingError::Io { path, .. } => assert!(path.ends_with("config.json")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
