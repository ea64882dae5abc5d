//! Subreddit crawler for Pushshift-style archive APIs.
//!
//! Pages backwards in time through all comments or submissions of a
//! subreddit and appends every element with usable text to a JSON-lines
//! file, one file per subreddit. The archive is polled with a `before`
//! cursor that follows the `created_utc` of the last element seen; the
//! crawl of a subreddit ends when a page makes no progress or the endpoint
//! stops answering.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::ValueEnum;
use log::{error, info, warn};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::words::load_list;

const USER_AGENT: &str = concat!("codeswitch_analysis/", env!("CARGO_PKG_VERSION"));

/// Default archive endpoint (the original Pushshift search API).
pub const DEFAULT_ENDPOINT: &str = "https://api.pushshift.io/reddit/search";

/// Maximum elements per page supported by the archive API.
pub const MAX_RETRIEVED_ELEMENTS: usize = 1000;

/// Whether to retrieve comments or submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RetrievalType {
    Comment,
    Submission,
}

impl RetrievalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalType::Comment => "comment",
            RetrievalType::Submission => "submission",
        }
    }
}

pub struct CrawlOptions {
    pub endpoint: String,
    pub retrieval_type: RetrievalType,
    pub out_dir: PathBuf,
    pub page_size: usize,
}

impl CrawlOptions {
    /// Output file for one subreddit: `{out_dir}/{subreddit}.{type}.json.out`.
    pub fn out_file(&self, subreddit: &str) -> PathBuf {
        self.out_dir
            .join(format!("{subreddit}.{}.json.out", self.retrieval_type.as_str()))
    }
}

/// Builds the blocking HTTP client used for all archive requests.
pub fn build_client() -> Result<Client, String> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| format!("Build HTTP client failed: {e}"))
}

/// Crawls every subreddit listed in `subreddits_file` (one name per line).
/// A failing subreddit is logged and skipped; the rest continue.
pub fn run(subreddits_file: &Path, opts: &CrawlOptions) -> Result<(), String> {
    let subreddits = load_list(subreddits_file)?;
    if subreddits.is_empty() {
        return Err(format!("{}: no subreddits listed", subreddits_file.display()));
    }
    std::fs::create_dir_all(&opts.out_dir)
        .map_err(|e| format!("Create {} failed: {e}", opts.out_dir.display()))?;

    let client = build_client()?;
    for subreddit in &subreddits {
        match crawl_subreddit(&client, opts, subreddit) {
            Ok(kept) => info!("{subreddit}: wrote {kept} elements"),
            Err(e) => error!("{subreddit}: crawl aborted: {e}"),
        }
    }
    Ok(())
}

/// Crawls a single subreddit to its output file; returns the number of
/// elements written.
pub fn crawl_subreddit(
    client: &Client,
    opts: &CrawlOptions,
    subreddit: &str,
) -> Result<usize, String> {
    let out_path = opts.out_file(subreddit);
    let file =
        File::create(&out_path).map_err(|e| format!("Create {} failed: {e}", out_path.display()))?;
    let mut out = BufWriter::new(file);

    let mut before = Utc::now().timestamp();
    let mut previous = before;
    let mut kept = 0usize;
    let mut pages = 0usize;

    loop {
        pages += 1;
        let url = page_url(&opts.endpoint, opts.retrieval_type, subreddit, opts.page_size, before);
        info!("request #{pages}: {url}");

        let response = fetch_page(client, &url).map_err(|e| format!("Request {url} failed: {e}"))?;
        let Some(data) = response.get("data").and_then(Value::as_array) else {
            warn!("{subreddit}: response without data array, stopping");
            break;
        };

        for element in data {
            if has_text(element) {
                let line = serde_json::to_string(element)
                    .map_err(|e| format!("Serialize element failed: {e}"))?;
                writeln!(out, "{line}")
                    .map_err(|e| format!("Write {} failed: {e}", out_path.display()))?;
                out.flush()
                    .map_err(|e| format!("Flush {} failed: {e}", out_path.display()))?;
                kept += 1;
            }
            if let Some(created) = created_utc(element) {
                before = created;
            }
        }

        if before == previous {
            info!("{subreddit}: done after {pages} pages");
            break;
        }
        previous = before;
    }
    Ok(kept)
}

/// One archive page request URL.
pub fn page_url(
    endpoint: &str,
    retrieval_type: RetrievalType,
    subreddit: &str,
    size: usize,
    before: i64,
) -> String {
    format!(
        "{}/{}/?subreddit={}&sort=desc&size={}&before={}",
        endpoint.trim_end_matches('/'),
        retrieval_type.as_str(),
        subreddit,
        size,
        before
    )
}

/// True when the element carries a non-empty body or selftext that is not
/// the deletion tombstone.
pub fn has_text(element: &Value) -> bool {
    let body = element.get("body").and_then(Value::as_str).unwrap_or("");
    let selftext = element.get("selftext").and_then(Value::as_str).unwrap_or("");
    (!body.is_empty() && body != "[removed]") || (!selftext.is_empty() && selftext != "[removed]")
}

fn created_utc(element: &Value) -> Option<i64> {
    let value = element.get("created_utc")?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn fetch_page(client: &Client, url: &str) -> Result<Value, String> {
    let response = client.get(url).send().map_err(|e| e.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("bad response code: {status}"));
    }
    response.json::<Value>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_url_matches_archive_query_format() {
        let url = page_url(
            "https://api.pushshift.io/reddit/search/",
            RetrievalType::Comment,
            "france",
            1000,
            1_546_300_800,
        );
        assert_eq!(
            url,
            "https://api.pushshift.io/reddit/search/comment/?subreddit=france&sort=desc&size=1000&before=1546300800"
        );
    }

    #[test]
    fn has_text_rejects_empty_and_removed() {
        assert!(has_text(&json!({"body": "bonjour tout le monde"})));
        assert!(has_text(&json!({"selftext": "a submission"})));
        assert!(!has_text(&json!({"body": ""})));
        assert!(!has_text(&json!({"body": "[removed]"})));
        assert!(!has_text(&json!({"score": 3})));
        // a removed body with a live selftext still counts
        assert!(has_text(&json!({"body": "[removed]", "selftext": "kept"})));
    }

    #[test]
    fn created_utc_accepts_integer_and_float() {
        assert_eq!(created_utc(&json!({"created_utc": 100})), Some(100));
        assert_eq!(created_utc(&json!({"created_utc": 100.7})), Some(100));
        assert_eq!(created_utc(&json!({})), None);
    }

    #[test]
    fn out_file_names_follow_subreddit_and_type() {
        let opts = CrawlOptions {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retrieval_type: RetrievalType::Submission,
            out_dir: PathBuf::from("/tmp/allposts"),
            page_size: MAX_RETRIEVED_ELEMENTS,
        };
        assert_eq!(
            opts.out_file("mexico"),
            PathBuf::from("/tmp/allposts/mexico.submission.json.out")
        );
    }
}
