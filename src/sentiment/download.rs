// Model download helper for the ONNX sentiment model.
//
// Fetches distilbert-base-uncased-finetuned-sst-2-english (ONNX export,
// tokenizer and config) from HuggingFace into a platform-appropriate
// directory (~/.local/share/commentmood/models/ on Linux) so it persists
// across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the sentiment model.
const SENTIMENT_HF_URL: &str =
    "https://huggingface.co/distilbert/distilbert-base-uncased-finetuned-sst-2-english/resolve/main";

/// Local file names inside the model directory.
pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// Remote path of the ONNX export within the HuggingFace repo.
const REMOTE_MODEL_FILE: &str = "onnx/model.onnx";

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commentmood")
        .join("models")
}

/// Check whether every required model file exists.
pub fn model_files_present(dir: &Path) -> bool {
    [MODEL_FILE, TOKENIZER_FILE, CONFIG_FILE]
        .iter()
        .all(|f| dir.join(f).exists())
}

/// Download the sentiment model files.
///
/// Shows a progress bar for the model weights. Skips files that already
/// exist. Creates the directory as needed.
pub async fn download_model(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentiment model (distilbert-base-uncased-finetuned-sst-2-english):");

    let files = [
        (CONFIG_FILE, CONFIG_FILE, false),
        (TOKENIZER_FILE, TOKENIZER_FILE, false),
        (REMOTE_MODEL_FILE, MODEL_FILE, true),
    ];

    for (remote, local, large) in files {
        let dest = dir.join(local);
        if dest.exists() {
            info!("{} already exists, skipping", local);
            println!("  {} (already exists)", local);
            continue;
        }
        if large {
            println!("  Downloading {} (~255 MB)...", local);
        } else {
            println!("  Downloading {}...", local);
        }
        download_file(&format!("{}/{}", SENTIMENT_HF_URL, remote), &dest, large).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .context("Invalid progress bar template")?
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .context("Invalid progress bar template")?,
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    // Read chunk by chunk so the bar tracks real progress.
    let mut bytes = Vec::with_capacity(total_size.unwrap_or(0) as usize);
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    // Write to a temp name first so an interrupted download isn't mistaken
    // for a complete file on the next run.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into place at {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}
