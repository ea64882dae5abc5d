//! (In)formality comparison between code-switched and monolingual English
//! texts of the same authors.
//!
//! Informality markers come from a weighted log-odds run over a
//! formal/informal parallel corpus (see [`crate::logodds`]); a strongly
//! negative score marks an informal token. Per author, the marker rate in
//! their code-switched texts is paired with the rate in their monolingual
//! texts and the difference is tested with the Wilcoxon signed-rank test.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::post::{author_set, read_posts_csv};
use crate::snapshot::Snapshots;
use crate::stats;
use crate::words::{load_ranks, tokenize};

/// Tokens scoring below this in the formality log-odds listing count as
/// informality markers.
pub const LOG_ODDS_THRESHOLD: f64 = -5.0;
/// Rows with fewer text tokens than this are ignored.
pub const MIN_SENTENCE_LENGTH: usize = 10;
/// Authors need more than this many tokens on both sides to be compared.
pub const MIN_TOKENS_PER_AUTHOR: usize = 100;
/// Tokens ranked beyond this are out-of-vocabulary and not counted.
pub const MAX_WORD_RANK: usize = 10_000;

pub struct FormalityOptions {
    /// `word<TAB>score` listing from the formality log-odds run.
    pub markers_file: PathBuf,
    /// Code-switched posts CSV.
    pub cs_csv: PathBuf,
    /// Monolingual English posts CSV (same author population).
    pub mono_csv: PathBuf,
    /// Word-frequency rank list.
    pub ranks_file: PathBuf,
    pub snapshot_dir: PathBuf,
    /// Marker threshold; defaults to [`LOG_ODDS_THRESHOLD`].
    pub threshold: f64,
}

/// Parses informality markers out of a log-odds listing: tokens whose score
/// is below `threshold`. Malformed lines and purely numeric tokens are
/// skipped.
pub fn load_formality_markers(path: &Path, threshold: f64) -> Result<HashSet<String>, String> {
    let file = File::open(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut markers = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        if tokens[0].chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(score) = tokens[1].parse::<f64>() else { continue };
        if score < threshold {
            markers.insert(tokens[0].to_string());
        }
    }
    info!("loaded {} informality markers", markers.len());
    Ok(markers)
}

/// Per-author tokenized texts from a posts CSV, restricted to
/// `common_authors` and to rows of at least [`MIN_SENTENCE_LENGTH`] tokens.
pub fn load_author_texts(
    path: &Path,
    common_authors: &HashSet<String>,
) -> Result<HashMap<String, Vec<String>>, String> {
    let mut texts: HashMap<String, Vec<String>> = HashMap::new();
    for post in read_posts_csv(path)? {
        if post.text.split_whitespace().count() < MIN_SENTENCE_LENGTH {
            continue;
        }
        let author = post.author.trim().to_string();
        if !common_authors.contains(&author) {
            continue;
        }
        texts
            .entry(author)
            .or_default()
            .push(tokenize(&post.text).join(" "));
    }
    Ok(texts)
}

/// Marker rate of a tokenized text: among tokens that are in-vocabulary
/// (rank at most [`MAX_WORD_RANK`]) or markers themselves, the fraction
/// that are markers.
pub fn marker_frequency(
    text: &str,
    markers: &HashSet<String>,
    ranks: &HashMap<String, usize>,
) -> f64 {
    let mut considered = 0usize;
    let mut hits = 0usize;
    for token in text.split_whitespace() {
        let in_vocabulary = ranks.get(token).copied().unwrap_or(usize::MAX) <= MAX_WORD_RANK;
        let is_marker = markers.contains(token);
        if !in_vocabulary && !is_marker {
            continue;
        }
        considered += 1;
        if is_marker {
            hits += 1;
        }
    }
    if considered == 0 {
        return 0.0;
    }
    hits as f64 / considered as f64
}

/// Paired per-author marker rates for authors with enough text on both
/// sides, in deterministic author order.
pub fn extract_marker_frequencies(
    cs_texts: &HashMap<String, String>,
    mono_texts: &HashMap<String, String>,
    markers: &HashSet<String>,
    ranks: &HashMap<String, usize>,
) -> (Vec<f64>, Vec<f64>) {
    let mut authors: Vec<&String> = cs_texts.keys().collect();
    authors.sort();

    let mut cs_rates = Vec::new();
    let mut mono_rates = Vec::new();
    for author in authors {
        let cs = &cs_texts[author];
        let Some(mono) = mono_texts.get(author) else { continue };
        if cs.split_whitespace().count() <= MIN_TOKENS_PER_AUTHOR
            || mono.split_whitespace().count() <= MIN_TOKENS_PER_AUTHOR
        {
            continue;
        }
        cs_rates.push(marker_frequency(cs, markers, ranks));
        mono_rates.push(marker_frequency(mono, markers, ranks));
    }
    info!("extracted marker rates for {} paired authors", cs_rates.len());
    (cs_rates, mono_rates)
}

/// Full formality run: load markers and texts, pair authors, test, report.
pub fn run(opts: &FormalityOptions) -> Result<(), String> {
    let markers = load_formality_markers(&opts.markers_file, opts.threshold)?;
    let ranks = load_ranks(&opts.ranks_file)?;
    let store = Snapshots::new(&opts.snapshot_dir)?;

    let common: HashSet<String> = author_set(&opts.cs_csv)?
        .intersection(&author_set(&opts.mono_csv)?)
        .cloned()
        .collect();
    info!("{} authors with both post kinds", common.len());

    let cs_texts = load_author_texts(&opts.cs_csv, &common)?;
    let mono_texts = load_author_texts(&opts.mono_csv, &common)?;
    store.save("texts.cs.by.author", &cs_texts)?;
    store.save("texts.mono.by.author", &mono_texts)?;

    let cs_joined: HashMap<String, String> = cs_texts
        .into_iter()
        .map(|(author, texts)| (author, texts.join(" ")))
        .collect();
    let mono_joined: HashMap<String, String> = mono_texts
        .into_iter()
        .map(|(author, texts)| (author, texts.join(" ")))
        .collect();

    let (cs_rates, mono_rates) =
        extract_marker_frequencies(&cs_joined, &mono_joined, &markers, &ranks);
    store.save("formality.markers.cs", &cs_rates)?;
    store.save("formality.markers.non-cs", &mono_rates)?;
    if cs_rates.len() < 2 {
        return Err("not enough paired authors for the formality test".to_string());
    }

    println!(
        "mean markers frequency in cs: {:.6}, in non-cs: {:.6}",
        stats::mean(&cs_rates),
        stats::mean(&mono_rates)
    );
    match stats::wilcoxon_signed_rank(&cs_rates, &mono_rates) {
        Ok((statistic, p)) => {
            println!("paired wilcoxon signed-rank: statistic {statistic:.3}, p-value {p:.6}")
        }
        Err(e) => warn!("signed-rank test unavailable: {e}"),
    }
    println!(
        "std in cs: {:.6}, in non-cs: {:.6}",
        stats::std_dev(&cs_rates),
        stats::std_dev(&mono_rates)
    );
    println!(
        "spearman r: {:.3}, pearson r: {:.3}",
        stats::spearman(&cs_rates, &mono_rates)?,
        stats::pearson(&cs_rates, &mono_rates)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn ranks(words: &[&str]) -> HashMap<String, usize> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i + 1))
            .collect()
    }

    #[test]
    fn marker_parsing_skips_noise_and_applies_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formality.logodds.out");
        std::fs::write(&path, "lol\t-7.25\n42\t-9.0\nshort\nsir\t3.5\ngonna\t-5.1\nbad\tx\n")
            .unwrap();
        let found = load_formality_markers(&path, LOG_ODDS_THRESHOLD).unwrap();
        assert!(found.contains("lol"));
        assert!(found.contains("gonna"));
        assert!(!found.contains("42"));
        assert!(!found.contains("sir"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn marker_frequency_ignores_out_of_vocabulary_tokens() {
        let m = markers(&["lol"]);
        let r = ranks(&["you", "there", "hello"]);
        // "zzxqy" is neither ranked nor a marker: not considered at all
        let rate = marker_frequency("hello there lol zzxqy", &m, &r);
        assert!((rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn marker_frequency_of_empty_vocabulary_is_zero() {
        let rate = marker_frequency("zzxqy qqq", &markers(&["lol"]), &ranks(&[]));
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn pairing_requires_enough_text_on_both_sides() {
        let m = markers(&["lol"]);
        let r = ranks(&["word"]);
        let long_text = vec!["word"; MIN_TOKENS_PER_AUTHOR + 1].join(" ");
        let short_text = "word word".to_string();

        let mut cs = HashMap::new();
        cs.insert("a".to_string(), long_text.clone());
        cs.insert("b".to_string(), long_text.clone());
        let mut mono = HashMap::new();
        mono.insert("a".to_string(), long_text);
        mono.insert("b".to_string(), short_text);

        let (cs_rates, mono_rates) = extract_marker_frequencies(&cs, &mono, &m, &r);
        assert_eq!(cs_rates.len(), 1);
        assert_eq!(mono_rates.len(), 1);
    }
}
