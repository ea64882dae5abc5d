//! Discovery of translation-marker words.
//!
//! Posts that *translate* content ("rough translation of the lyrics: ...")
//! look bilingual to a language detector but are not code-switching. This
//! module compares the word distribution of known translation posts with
//! that of candidate code-switch posts and keeps the words most indicative
//! of translation; the extraction step later drops any post containing one
//! of them.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::post::read_posts_csv;
use crate::words::{function_words, load_wordlist, tokenize};

/// Counts content words over a set of texts: tokens of at least three
/// characters that are dictionary words but not function words.
pub fn count_content_words<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    dictionary: &HashSet<String>,
) -> HashMap<String, u64> {
    let function = function_words();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for token in tokenize(text) {
            if token.chars().count() < 3 {
                continue;
            }
            if function.contains(token.as_str()) {
                continue;
            }
            if !dictionary.contains(&token) {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

/// How indicative `word` is of the translation corpus: the ratio of its
/// relative frequency there to its relative frequency among code-switch
/// posts, or the former alone when the word never appears among them.
pub fn indicativeness(
    word: &str,
    translation_counts: &HashMap<String, u64>,
    cs_counts: &HashMap<String, u64>,
) -> f64 {
    let p_wt = translation_counts.get(word).copied().unwrap_or(0) as f64
        / translation_counts.len() as f64;
    match cs_counts.get(word) {
        Some(count) => {
            let p_w = *count as f64 / cs_counts.len() as f64;
            p_wt / p_w
        }
        None => p_wt,
    }
}

/// The `k` words of the translation corpus most indicative of translation,
/// highest score first.
pub fn top_markers(
    translation_counts: &HashMap<String, u64>,
    cs_counts: &HashMap<String, u64>,
    k: usize,
) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = translation_counts
        .keys()
        .map(|word| (word.clone(), indicativeness(word, translation_counts, cs_counts)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

/// Reads the `word,score` marker CSV (or any file whose first column is the
/// marker word) back into a lowercased lookup set.
pub fn load_marker_words(path: &Path) -> Result<HashSet<String>, String> {
    let file = File::open(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut markers = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        if let Some(word) = line.split([',', '\t', ' ']).next() {
            let word = word.trim().to_lowercase();
            if !word.is_empty() {
                markers.insert(word);
            }
        }
    }
    info!("loaded {} translation markers from {}", markers.len(), path.display());
    Ok(markers)
}

/// Full discovery pass: count both corpora, rank, and write the top `k`
/// markers as `word,score` rows.
pub fn run(
    translation_csv: &Path,
    cs_csv: &Path,
    dictionary_file: &Path,
    k: usize,
    out_csv: &Path,
) -> Result<(), String> {
    let dictionary = load_wordlist(dictionary_file)?;
    let translation_posts = read_posts_csv(translation_csv)?;
    let cs_posts = read_posts_csv(cs_csv)?;

    let translation_counts =
        count_content_words(translation_posts.iter().map(|p| p.text.as_str()), &dictionary);
    let cs_counts = count_content_words(cs_posts.iter().map(|p| p.text.as_str()), &dictionary);
    let markers = top_markers(&translation_counts, &cs_counts, k);

    let mut writer = csv::Writer::from_path(out_csv)
        .map_err(|e| format!("Create {} failed: {e}", out_csv.display()))?;
    for (word, score) in &markers {
        writer
            .write_record([word.as_str(), &score.to_string()])
            .map_err(|e| format!("Write {} failed: {e}", out_csv.display()))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Flush {} failed: {e}", out_csv.display()))?;
    info!("wrote {} markers to {}", markers.len(), out_csv.display());
    Ok(())
}
