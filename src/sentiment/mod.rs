// Sentiment scoring: trait-based classifier plus the per-comment loop.
//
// SentimentClassifier is the seam; OnnxSentimentClassifier is the local
// implementation. `analyze` turns a batch of texts into one result per text.

pub mod analyze;
pub mod download;
pub mod onnx;
pub mod traits;
