// Per-comment sentiment scoring with per-item error isolation.
//
// Each text is classified on its own. A failure on one text becomes an
// "Error" result for that text and the loop moves on, so one oversized or
// malformed comment never costs the rest of the report.

use serde::{Serialize, Serializer};
use tracing::{error, info};

use super::traits::SentimentClassifier;
use crate::output::truncate_chars;

/// Label reported for texts the classifier failed on.
pub const ERROR_LABEL: &str = "Error";

/// How many characters of a failing comment to include in the log line.
pub const LOG_PREVIEW_CHARS: usize = 50;

/// What the classifier concluded for one text.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Classified { label: String, score: f64 },
    Failed { error_message: String },
}

/// One scored comment.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentResult {
    pub comment_text: String,
    pub verdict: Verdict,
}

/// Flat JSON shape of a result: every row has `label` and `score`.
#[derive(Serialize)]
struct ResultRow<'a> {
    comment_text: &'a str,
    status: &'static str,
    label: &'a str,
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

impl Serialize for SentimentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResultRow {
            comment_text: &self.comment_text,
            status: self.status(),
            label: self.label(),
            score: self.score(),
            error_message: self.error_message(),
        }
        .serialize(serializer)
    }
}

impl SentimentResult {
    /// The classifier's label, or `"Error"` if classification failed.
    pub fn label(&self) -> &str {
        match &self.verdict {
            Verdict::Classified { label, .. } => label.as_str(),
            Verdict::Failed { .. } => ERROR_LABEL,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match &self.verdict {
            Verdict::Classified { score, .. } => Some(*score),
            Verdict::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Classified { .. } => None,
            Verdict::Failed { error_message } => Some(error_message.as_str()),
        }
    }

    /// `"classified"` or `"failed"`.
    pub fn status(&self) -> &'static str {
        match self.verdict {
            Verdict::Classified { .. } => "classified",
            Verdict::Failed { .. } => "failed",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.verdict, Verdict::Failed { .. })
    }
}

/// Score every text in order. Always returns exactly one result per input.
pub async fn analyze_sentiment(
    classifier: &dyn SentimentClassifier,
    texts: &[String],
) -> Vec<SentimentResult> {
    info!("Analyzing sentiment of {} comment texts", texts.len());

    let mut results = Vec::with_capacity(texts.len());
    for text in texts {
        let verdict = match classifier.top_label(text).await {
            Ok(top) => Verdict::Classified {
                label: top.label,
                score: top.score,
            },
            Err(e) => {
                error!(
                    "Error analyzing sentiment for comment: '{}': {e:#}",
                    truncate_chars(text, LOG_PREVIEW_CHARS)
                );
                Verdict::Failed {
                    error_message: non_empty_message(format!("{e:#}")),
                }
            }
        };
        results.push(SentimentResult {
            comment_text: text.clone(),
            verdict,
        });
    }

    info!(
        "Sentiment analysis completed for {} comments",
        results.len()
    );
    results
}

/// Errors with an empty Display still need a message in the report.
fn non_empty_message(message: String) -> String {
    if message.trim().is_empty() {
        "unknown classification error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_reports_error_label() {
        let result = SentimentResult {
            comment_text: "x".to_string(),
            verdict: Verdict::Failed {
                error_message: "too long".to_string(),
            },
        };
        assert_eq!(result.label(), "Error");
        assert_eq!(result.score(), None);
        assert_eq!(result.error_message(), Some("too long"));
        assert!(result.is_error());
    }

    #[test]
    fn test_json_shape() {
        let result = SentimentResult {
            comment_text: "great movie".to_string(),
            verdict: Verdict::Classified {
                label: "POSITIVE".to_string(),
                score: 0.5,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["comment_text"], "great movie");
        assert_eq!(json["status"], "classified");
        assert_eq!(json["label"], "POSITIVE");
        assert_eq!(json["score"], 0.5);
        assert!(json.get("error_message").is_none());

        let failed = SentimentResult {
            comment_text: "x".repeat(600),
            verdict: Verdict::Failed {
                error_message: "sequence too long".to_string(),
            },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["label"], "Error");
        assert!(json["score"].is_null());
        assert!(json.as_object().unwrap().contains_key("score"));
        assert_eq!(json["error_message"], "sequence too long");
    }

    #[test]
    fn test_non_empty_message_fills_blank() {
        assert_eq!(non_empty_message(String::new()), "unknown classification error");
        assert_eq!(non_empty_message("boom".to_string()), "boom");
    }
}
