// Local ONNX sentiment classifier.
//
// Runs a sequence-classification model (by default
// distilbert-base-uncased-finetuned-sst-2-english, the model most sentiment
// pipelines fall back to) entirely on the local CPU. Labels are read from the
// model's config.json, so any binary or multi-class export with the same
// inputs works.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::debug;

use super::download::{CONFIG_FILE, MODEL_FILE, TOKENIZER_FILE};
use super::traits::{rank, LabelScore, SentimentClassifier};

/// Longest token sequence (special tokens included) the model accepts.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// Local ONNX-based sentiment classifier.
pub struct OnnxSentimentClassifier {
    // ort::Session::run takes &mut self; spawn_blocking needs 'static.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    /// Label names indexed by output position.
    labels: Arc<Vec<String>>,
}

impl OnnxSentimentClassifier {
    /// Load the ONNX model, tokenizer and label map from `model_dir`.
    ///
    /// Call `download::download_model()` first if the files aren't there.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let config_path = model_dir.join(CONFIG_FILE);

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Model file not found: {}\nRun `commentmood download-model` to download it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        // Over-long inputs must fail rather than be silently cut short.
        tokenizer
            .with_truncation(None)
            .map_err(|e| anyhow::anyhow!("Failed to disable tokenizer truncation: {}", e))?;

        let config_json = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let labels = parse_labels(&config_json)?;

        debug!(
            labels = ?labels,
            "Loaded ONNX sentiment model from {}",
            model_dir.display()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
        })
    }
}

#[async_trait]
impl SentimentClassifier for OnnxSentimentClassifier {
    /// Tokenize, run one forward pass, softmax the logits and rank labels.
    ///
    /// Tokenization and inference are CPU-bound, so they run on a blocking
    /// thread to keep the async runtime responsive.
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let seq_len = encoding.get_ids().len();
            check_sequence_length(seq_len)?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();

            // Shape: [1, seq_len]
            let shape = [1_i64, seq_len as i64];
            let input_ids_tensor = Tensor::from_array((shape, input_ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [1, num_labels], raw logits
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            let scores = to_label_scores(&logits, &labels)?;

            debug!(
                top = %scores[0].label,
                score = scores[0].score,
                tokens = seq_len,
                text_preview = %crate::output::truncate_chars(&text, 50),
                "ONNX classified text"
            );

            Ok(scores)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Reject inputs the model can't take in one pass.
fn check_sequence_length(len: usize) -> Result<()> {
    if len > MAX_SEQUENCE_LENGTH {
        anyhow::bail!(
            "Token sequence length {len} exceeds the model's maximum of {MAX_SEQUENCE_LENGTH}"
        );
    }
    Ok(())
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Pair softmaxed logits with label names and rank them.
fn to_label_scores(logits: &[f32], labels: &[String]) -> Result<Vec<LabelScore>> {
    if logits.is_empty() || logits.len() != labels.len() {
        anyhow::bail!(
            "Model produced {} logits but config defines {} labels",
            logits.len(),
            labels.len()
        );
    }

    let mut scores: Vec<LabelScore> = softmax(logits)
        .into_iter()
        .zip(labels)
        .map(|(score, label)| LabelScore {
            label: label.clone(),
            score,
        })
        .collect();
    rank(&mut scores);
    Ok(scores)
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: BTreeMap<String, String>,
}

/// Read `id2label` from a Hugging Face config.json into a position-indexed list.
fn parse_labels(config_json: &str) -> Result<Vec<String>> {
    let config: ModelConfig =
        serde_json::from_str(config_json).context("Failed to parse model config.json")?;

    let mut indexed: Vec<(usize, String)> = config
        .id2label
        .into_iter()
        .map(|(k, v)| {
            k.parse::<usize>()
                .map(|i| (i, v))
                .with_context(|| format!("Invalid id2label key: {k}"))
        })
        .collect::<Result<_>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    if indexed.is_empty() {
        anyhow::bail!("Model config.json defines no labels");
    }
    for (expected, (actual, _)) in indexed.iter().enumerate() {
        if expected != *actual {
            anyhow::bail!("Model config.json id2label is not contiguous (missing {expected})");
        }
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.5, -2.0, 0.3]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_softmax_equal_logits() {
        let probs = softmax(&[2.0, 2.0]);
        assert!((probs[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_softmax_large_logits_stay_finite() {
        let probs = softmax(&[1000.0, -1000.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[0] > 0.999);
    }

    #[test]
    fn test_to_label_scores_ranks_top_first() {
        let labels = vec!["NEGATIVE".to_string(), "POSITIVE".to_string()];
        let scores = to_label_scores(&[-3.0, 4.0], &labels).unwrap();
        assert_eq!(scores[0].label, "POSITIVE");
        assert!(scores[0].score > 0.99);
        assert_eq!(scores[1].label, "NEGATIVE");
    }

    #[test]
    fn test_to_label_scores_rejects_shape_mismatch() {
        let labels = vec!["NEGATIVE".to_string(), "POSITIVE".to_string()];
        assert!(to_label_scores(&[0.1, 0.2, 0.3], &labels).is_err());
        assert!(to_label_scores(&[], &labels).is_err());
    }

    #[test]
    fn test_parse_labels_sst2_config() {
        let json = r#"{
            "architectures": ["DistilBertForSequenceClassification"],
            "id2label": {"0": "NEGATIVE", "1": "POSITIVE"},
            "label2id": {"NEGATIVE": 0, "POSITIVE": 1}
        }"#;
        assert_eq!(parse_labels(json).unwrap(), vec!["NEGATIVE", "POSITIVE"]);
    }

    #[test]
    fn test_parse_labels_orders_numerically() {
        // "10" sorts before "2" as a string
        let mut map = serde_json::Map::new();
        for i in 0..11 {
            map.insert(i.to_string(), serde_json::Value::String(format!("L{i}")));
        }
        let json = serde_json::json!({ "id2label": map }).to_string();
        let labels = parse_labels(&json).unwrap();
        assert_eq!(labels[2], "L2");
        assert_eq!(labels[10], "L10");
    }

    #[test]
    fn test_parse_labels_rejects_gaps() {
        let json = r#"{"id2label": {"0": "NEGATIVE", "2": "POSITIVE"}}"#;
        assert!(parse_labels(json).is_err());
    }

    #[test]
    fn test_sequence_length_limit() {
        assert!(check_sequence_length(MAX_SEQUENCE_LENGTH).is_ok());
        assert!(check_sequence_length(MAX_SEQUENCE_LENGTH + 1).is_err());
    }
}
