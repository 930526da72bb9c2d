// Colored terminal output for the per-comment sentiment report.

use colored::Colorize;

use crate::sentiment::analyze::{SentimentResult, ERROR_LABEL};

/// Tally of labels across a report.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub other: usize,
    pub errors: usize,
}

impl LabelCounts {
    pub fn from_results(results: &[SentimentResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            match result.label() {
                "POSITIVE" => counts.positive += 1,
                "NEGATIVE" => counts.negative += 1,
                ERROR_LABEL if result.is_error() => counts.errors += 1,
                _ => counts.other += 1,
            }
        }
        counts
    }
}

/// Print the header line announcing how many comments were fetched.
pub fn display_fetch_summary(count: usize, subreddit: &str, submission_id: &str) {
    if count == 0 {
        println!(
            "{}",
            format!("Fetched 0 comments from r/{subreddit}, submission ID: {submission_id}")
                .yellow()
        );
        return;
    }
    println!(
        "Successfully fetched {} comment texts from r/{}, submission ID: {}",
        count.to_string().bold(),
        subreddit,
        submission_id
    );
}

/// Display every scored comment followed by a label summary.
pub fn display_results(results: &[SentimentResult], preview_chars: usize) {
    if results.is_empty() {
        println!("Sentiment analysis returned no results.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "--- Sentiment Analysis Results (All {} Comments) ---",
            results.len()
        )
        .bold()
    );

    for (i, result) in results.iter().enumerate() {
        let preview = super::truncate_chars(&result.comment_text, preview_chars);
        println!("\nComment {}: '{}'", i + 1, preview.dimmed());
        println!("  Sentiment: {}", colorize_label(result.label()));
        match result.score() {
            Some(score) => println!("  Score: {:.4}", score),
            None => println!("  Score: {}", "n/a".dimmed()),
        }
        if let Some(message) = result.error_message() {
            println!("  Error: {}", message.red());
        }
    }

    let counts = LabelCounts::from_results(results);
    println!("\n{}", "=== Summary ===".bold());
    println!("  {} positive", counts.positive.to_string().green());
    println!("  {} negative", counts.negative.to_string().red());
    if counts.other > 0 {
        println!("  {} other", counts.other);
    }
    if counts.errors > 0 {
        println!("  {} errors", counts.errors.to_string().yellow());
    }
}

/// Colorize a sentiment label.
fn colorize_label(label: &str) -> colored::ColoredString {
    match label {
        "POSITIVE" => label.green().bold(),
        "NEGATIVE" => label.red().bold(),
        ERROR_LABEL => label.yellow(),
        _ => label.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::analyze::Verdict;

    fn classified(label: &str) -> SentimentResult {
        SentimentResult {
            comment_text: "text".to_string(),
            verdict: Verdict::Classified {
                label: label.to_string(),
                score: 0.9,
            },
        }
    }

    #[test]
    fn test_label_counts() {
        let results = vec![
            classified("POSITIVE"),
            classified("POSITIVE"),
            classified("NEGATIVE"),
            classified("NEUTRAL"),
            SentimentResult {
                comment_text: "bad".to_string(),
                verdict: Verdict::Failed {
                    error_message: "boom".to_string(),
                },
            },
        ];
        let counts = LabelCounts::from_results(&results);
        assert_eq!(
            counts,
            LabelCounts {
                positive: 2,
                negative: 1,
                other: 1,
                errors: 1,
            }
        );
    }
}
