//! Code-switch extraction over crawled subreddit files.
//!
//! Reads the JSON-lines files produced by the crawler, one per
//! country-subreddit, decides per post whether it is code-switched, and
//! exports all hits as one CSV of [`Post`] rows. Countries are independent
//! and are processed by a fixed-size worker pool.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::countries::ENGLISH_COUNTRIES;
use crate::crawl::RetrievalType;
use crate::detect;
use crate::post::{Post, write_posts_csv};
use crate::translation::load_marker_words;
use crate::words::load_list;

pub struct ExtractOptions {
    /// Directory holding `{country}.{type}.json.out` files.
    pub posts_dir: PathBuf,
    pub retrieval_type: RetrievalType,
    /// Translation-marker lexicon; posts containing a marker are dropped.
    pub translation_words: Option<PathBuf>,
    /// Worker pool size for the per-country fan-out.
    pub workers: usize,
}

/// Extracts code-switched posts for every country listed in
/// `countries_file` and writes them to `out_csv`. Majority-English
/// countries are skipped; a failing country is logged and skipped.
pub fn run(countries_file: &Path, opts: &ExtractOptions, out_csv: &Path) -> Result<(), String> {
    let countries: Vec<String> = load_list(countries_file)?
        .into_iter()
        .filter(|country| !ENGLISH_COUNTRIES.contains(&country.as_str()))
        .collect();
    if countries.is_empty() {
        return Err(format!("{}: no eligible countries", countries_file.display()));
    }

    let markers = match &opts.translation_words {
        Some(path) => Some(load_marker_words(path)?),
        None => None,
    };
    let files = discover_crawled(&opts.posts_dir, opts.retrieval_type)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers)
        .build()
        .map_err(|e| format!("Build worker pool failed: {e}"))?;
    let results: Vec<(String, Result<Vec<Post>, String>)> = pool.install(|| {
        countries
            .par_iter()
            .map(|country| {
                let result = match files.get(&country.to_lowercase()) {
                    Some(path) => extract_country(path, country, markers.as_ref()),
                    None => {
                        warn!("{country}: no crawled file under {}", opts.posts_dir.display());
                        Ok(Vec::new())
                    }
                };
                (country.clone(), result)
            })
            .collect()
    });

    let mut posts = Vec::new();
    for (country, result) in results {
        match result {
            Ok(found) => posts.extend(found),
            Err(e) => error!("{country}: extraction failed: {e}"),
        }
    }
    write_posts_csv(out_csv, &posts)?;
    info!("wrote {} code-switched posts to {}", posts.len(), out_csv.display());
    Ok(())
}

/// Scans one crawled file and returns its code-switched posts.
pub fn extract_country(
    path: &Path,
    country: &str,
    markers: Option<&HashSet<String>>,
) -> Result<Vec<Post>, String> {
    let file = File::open(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut posts = Vec::new();
    let mut skipped = 0usize;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        let Ok(data) = serde_json::from_str::<serde_json::Value>(&line) else {
            skipped += 1;
            continue;
        };
        let Some(subreddit) = data.get("subreddit").and_then(|v| v.as_str()) else {
            continue;
        };
        let author = data.get("author").and_then(|v| v.as_str()).unwrap_or("");
        if author.is_empty() || author.to_lowercase().contains("bot") || author.contains("AutoModerator")
        {
            continue;
        }

        let text = data
            .get("body")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| data.get("selftext").and_then(|v| v.as_str()).filter(|s| !s.is_empty()));
        let Some(text) = text else { continue };

        if let Some(pair) = detect::find_langs(text, markers) {
            posts.push(Post {
                author: author.to_string(),
                subreddit: subreddit.to_string(),
                country: country.to_string(),
                date: data
                    .get("created_utc")
                    .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                    .unwrap_or(0),
                confidence: pair.confidence,
                lang1: pair.lang1,
                lang2: pair.lang2,
                text: text.to_string(),
                id: field(&data, "id"),
                link_id: field(&data, "link_id"),
                parent_id: field(&data, "parent_id"),
            });
        }
    }
    if skipped > 0 {
        warn!("{}: skipped {skipped} malformed lines", path.display());
    }
    info!("{country} done, {} code-switched posts", posts.len());
    Ok(posts)
}

/// Maps lowercased country names to their crawled files under `dir`.
pub fn discover_crawled(
    dir: &Path,
    retrieval_type: RetrievalType,
) -> Result<HashMap<String, PathBuf>, String> {
    let suffix = format!(".{}.json.out", retrieval_type.as_str());
    let mut files = HashMap::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| format!("Scan {} failed: {e}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(country) = name.strip_suffix(&suffix) {
            files.insert(country.to_lowercase(), entry.path().to_path_buf());
        }
    }
    Ok(files)
}

fn field(data: &serde_json::Value, key: &str) -> String {
    data.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BILINGUAL: &str = "honestly the meeting today went much better than anyone expected \
        it would and everyone seemed genuinely pleased with the outcome of the discussion \
        pero despues de la reunion tuvimos que caminar hasta la estacion porque los autobuses \
        estaban completamente llenos de gente cansada";

    fn write_lines(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn extraction_keeps_only_codeswitched_posts() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![
            // bot and missing-subreddit records are filtered before detection
            format!(
                r#"{{"subreddit":"mexico","author":"helper_bot","body":{:?},"created_utc":5,"id":"a","link_id":"l","parent_id":"p"}}"#,
                BILINGUAL
            ),
            format!(r#"{{"author":"user1","body":{BILINGUAL:?},"created_utc":6}}"#),
            "not json at all".to_string(),
            r#"{"subreddit":"mexico","author":"user2","body":"a plain short comment in english about nothing in particular that keeps going on for quite a while longer","created_utc":7,"id":"b","link_id":"l2","parent_id":"p2"}"#
                .to_string(),
            format!(
                r#"{{"subreddit":"mexico","author":"user3","body":{BILINGUAL:?},"created_utc":8,"id":"c","link_id":"l3","parent_id":"p3"}}"#
            ),
        ];
        let path = write_lines(dir.path(), "Mexico.comment.json.out", &lines);

        let posts = extract_country(&path, "Mexico", None).unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.author, "user3");
        assert_eq!(post.country, "Mexico");
        assert_eq!(post.date, 8);
        assert_eq!(post.id, "c");
        let langs = [post.lang1.as_str(), post.lang2.as_str()];
        assert!(langs.contains(&"English"));
        assert!(langs.contains(&"Spanish"));
    }

    #[test]
    fn discover_maps_countries_to_files() {
        let dir = tempfile::tempdir().unwrap();
        write_lines(dir.path(), "France.comment.json.out", &[]);
        write_lines(dir.path(), "notes.txt", &[]);
        let files = discover_crawled(dir.path(), RetrievalType::Comment).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.contains_key("france"));
    }
}
