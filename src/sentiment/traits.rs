// Sentiment classifier trait: the swap-ready abstraction.
//
// The default implementation runs a local ONNX export of
// distilbert-base-uncased-finetuned-sst-2-english. Tests plug in fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One label with the classifier's confidence in it (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Trait for classifying the sentiment of one text.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify a single text. Returns every label the model knows, ranked
    /// by descending confidence.
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>>;

    /// The top-ranked label only.
    async fn top_label(&self, text: &str) -> Result<LabelScore> {
        self.classify(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Classifier returned no labels"))
    }
}

/// Sort label scores by descending confidence, in place.
pub fn rank(scores: &mut [LabelScore]) {
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_orders_descending() {
        let mut scores = vec![
            LabelScore {
                label: "NEGATIVE".to_string(),
                score: 0.1,
            },
            LabelScore {
                label: "POSITIVE".to_string(),
                score: 0.9,
            },
        ];
        rank(&mut scores);
        assert_eq!(scores[0].label, "POSITIVE");
        assert_eq!(scores[1].label, "NEGATIVE");
    }
}
