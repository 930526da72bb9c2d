use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use commentmood::config::Config;
use commentmood::reddit::collector::{collect_comments, CollectOutcome};
use commentmood::reddit::traits::ThreadCoordinates;
use commentmood::sentiment::traits::SentimentClassifier;

/// Commentmood: sentiment report for every comment in a Reddit thread.
///
/// Fetches all comments (expanding every "load more" branch), scores each
/// one with a local pretrained sentiment model, and prints the results.
#[derive(Parser)]
#[command(name = "commentmood", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a thread's comments and score their sentiment
    Analyze {
        /// Subreddit name without the r/ prefix (e.g. movies)
        subreddit: String,

        /// Submission ID (e.g. 1j5e3f7)
        submission_id: String,

        /// Print results as JSON instead of the colored report
        #[arg(long)]
        json: bool,

        /// Characters of each comment to show in the report (default: 50)
        #[arg(long, default_value = "50")]
        preview: usize,
    },

    /// Download the ONNX sentiment model (~255 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("commentmood=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            subreddit,
            submission_id,
            json,
            preview,
        } => {
            let config = Config::load()?;
            config.require_reddit()?;

            let coords = ThreadCoordinates::new(subreddit, submission_id);
            let outcome =
                collect_comments(&coords, &config.credentials(), &config.endpoints()).await;

            if let CollectOutcome::Failed(ref failure) = outcome {
                eprintln!("{} {}", "Fetch failed:".red(), failure.cause);
            }
            let texts = outcome.into_batch();

            if !json {
                commentmood::output::terminal::display_fetch_summary(
                    texts.len(),
                    &coords.subreddit,
                    &coords.submission_id,
                );
            }

            if texts.is_empty() {
                if json {
                    println!("[]");
                }
                return Ok(());
            }

            // Only load the model once there is something to score
            config.require_model()?;
            let classifier = create_classifier(&config)?;
            let results =
                commentmood::sentiment::analyze::analyze_sentiment(classifier.as_ref(), &texts)
                    .await;

            if json {
                println!("{}", commentmood::output::to_json(&results)?);
            } else {
                commentmood::output::terminal::display_results(&results, preview);
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX sentiment model...");
            println!("  Destination: {}", model_dir.display());

            commentmood::sentiment::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `commentmood analyze <subreddit> <submission_id>`.");
        }
    }

    Ok(())
}

/// Load the local sentiment classifier.
fn create_classifier(config: &Config) -> Result<Box<dyn SentimentClassifier>> {
    info!("Using local ONNX sentiment classifier");
    let classifier =
        commentmood::sentiment::onnx::OnnxSentimentClassifier::load(&config.model_dir)?;
    Ok(Box::new(classifier))
}
