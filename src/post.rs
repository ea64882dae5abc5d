//! The post record exchanged between the pipeline commands via CSV.

use std::collections::HashSet;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

/// One social-media post, as exported by `extract` and consumed by the
/// downstream analysis commands. Column names follow the export header:
/// `Author, Subreddit, Country, Date, confidence, Lang1, Lang2, Text, id,
/// link_id, parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Subreddit")]
    pub subreddit: String,
    #[serde(rename = "Country")]
    pub country: String,
    /// Unix timestamp of the post.
    #[serde(rename = "Date")]
    pub date: i64,
    /// Share of the secondary language in the post, percent.
    #[serde(rename = "confidence")]
    pub confidence: f64,
    #[serde(rename = "Lang1")]
    pub lang1: String,
    #[serde(rename = "Lang2")]
    pub lang2: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "link_id")]
    pub link_id: String,
    #[serde(rename = "parent_id")]
    pub parent_id: String,
}

/// Writes posts as a CSV file with the standard header.
pub fn write_posts_csv(path: &Path, posts: &[Post]) -> Result<(), String> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| format!("Create {} failed: {e}", path.display()))?;
    for post in posts {
        writer
            .serialize(post)
            .map_err(|e| format!("Write {} failed: {e}", path.display()))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Flush {} failed: {e}", path.display()))
}

/// Reads a posts CSV, skipping rows that fail to deserialize.
pub fn read_posts_csv(path: &Path) -> Result<Vec<Post>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut posts = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<Post>() {
        match record {
            Ok(post) => posts.push(post),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{}: skipped {skipped} malformed rows", path.display());
    }
    Ok(posts)
}

/// The set of authors appearing in a posts CSV.
pub fn author_set(path: &Path) -> Result<HashSet<String>, String> {
    Ok(read_posts_csv(path)?
        .into_iter()
        .map(|post| post.author.trim().to_string())
        .collect())
}
