use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::reddit::client::{RedditEndpoints, DEFAULT_API_URL, DEFAULT_AUTH_URL};
use crate::reddit::traits::AccessCredentials;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    /// Reddit requires a descriptive user agent, e.g.
    /// "CommentSentimentAnalyzer by /u/yourname".
    pub reddit_user_agent: String,
    /// OAuth API host (defaults to https://oauth.reddit.com).
    pub reddit_api_url: String,
    /// Token endpoint host (defaults to https://www.reddit.com).
    pub reddit_auth_url: String,
    /// Directory containing the ONNX sentiment model files
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the endpoints and model directory have defaults; the Reddit
    /// credentials are required for `analyze`.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("COMMENTMOOD_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::sentiment::download::default_model_dir());

        Ok(Self {
            reddit_client_id: env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            reddit_user_agent: env::var("REDDIT_USER_AGENT").unwrap_or_default(),
            reddit_api_url: env::var("REDDIT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            reddit_auth_url: env::var("REDDIT_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            model_dir,
        })
    }

    /// Check that all three Reddit credentials are configured.
    pub fn require_reddit(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("REDDIT_CLIENT_ID", &self.reddit_client_id),
            ("REDDIT_CLIENT_SECRET", &self.reddit_client_secret),
            ("REDDIT_USER_AGENT", &self.reddit_user_agent),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "{} not set. Add your Reddit API credentials to your .env file.\n\
                 Create a script app at https://www.reddit.com/prefs/apps to get them.",
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Check that the ONNX model files exist.
    pub fn require_model(&self) -> Result<()> {
        if !crate::sentiment::download::model_files_present(&self.model_dir) {
            anyhow::bail!(
                "Sentiment model files not found in {}\n\
                 Run `commentmood download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }

    pub fn credentials(&self) -> AccessCredentials {
        AccessCredentials {
            client_id: self.reddit_client_id.clone(),
            client_secret: self.reddit_client_secret.clone(),
            user_agent: self.reddit_user_agent.clone(),
        }
    }

    pub fn endpoints(&self) -> RedditEndpoints {
        RedditEndpoints {
            api_url: self.reddit_api_url.clone(),
            auth_url: self.reddit_auth_url.clone(),
        }
    }
}
