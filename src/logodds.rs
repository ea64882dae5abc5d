//! Weighted log-odds-ratio with an informative Dirichlet prior.
//!
//! Compares word usage rates between two corpora, smoothing each word's
//! counts with a background (prior) corpus so that rare words do not
//! dominate the ranking. For word `w` with corpus counts `y1`, `y2`, prior
//! count `a` and totals `n1`, `n2`, `a0`:
//!
//! ```text
//! l1      = (y1 + a) / (n1 + a0 - y1 - a)
//! l2      = (y2 + a) / (n2 + a0 - y2 - a)
//! sigma^2 = 1/(y1 + a) + 1/(y2 + a)
//! delta   = (ln l1 - ln l2) / sqrt(sigma^2)
//! ```
//!
//! Positive `delta` marks words over-represented in the first corpus,
//! negative in the second.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use log::info;

/// Token counts of one corpus.
pub type Counts = HashMap<String, f64>;

/// Loads token counts from a whitespace-tokenized text file. Tokens below
/// `min_count` or in `stopwords` are dropped.
pub fn load_counts(
    path: &Path,
    min_count: u64,
    stopwords: &HashSet<String>,
) -> Result<Counts, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut raw: HashMap<&str, u64> = HashMap::new();
    for token in contents.split_whitespace() {
        *raw.entry(token).or_insert(0) += 1;
    }
    let counts: Counts = raw
        .into_iter()
        .filter(|(token, count)| *count >= min_count && !stopwords.contains(*token))
        .map(|(token, count)| (token.to_string(), count as f64))
        .collect();
    info!("{}: {} distinct tokens", path.display(), counts.len());
    Ok(counts)
}

/// Computes the weighted log-odds score for every word of the prior.
///
/// Counts round half-up to whole numbers first, and every word seen in
/// either corpus is guaranteed a prior count of at least one, so the
/// denominators of the formula never vanish.
pub fn compute_log_odds(
    mut counts1: Counts,
    mut counts2: Counts,
    mut prior: Counts,
) -> HashMap<String, f64> {
    for count in prior.values_mut() {
        *count = (*count + 0.5).floor();
    }
    for word in counts2.keys().cloned().collect::<Vec<_>>() {
        let rounded = (counts1.get(&word).copied().unwrap_or(0.0) + 0.5).floor();
        counts1.insert(word.clone(), rounded);
        let entry = prior.entry(word).or_insert(0.0);
        if *entry == 0.0 {
            *entry = 1.0;
        }
    }
    for word in counts1.keys().cloned().collect::<Vec<_>>() {
        let rounded = (counts2.get(&word).copied().unwrap_or(0.0) + 0.5).floor();
        counts2.insert(word.clone(), rounded);
        let entry = prior.entry(word).or_insert(0.0);
        if *entry == 0.0 {
            *entry = 1.0;
        }
    }

    let n1: f64 = counts1.values().sum();
    let n2: f64 = counts2.values().sum();
    let nprior: f64 = prior.values().sum();

    let mut delta = HashMap::with_capacity(prior.len());
    for (word, a) in &prior {
        if *a <= 0.0 {
            continue;
        }
        let y1 = counts1.get(word).copied().unwrap_or(0.0);
        let y2 = counts2.get(word).copied().unwrap_or(0.0);
        let l1 = (y1 + a) / (n1 + nprior - y1 - a);
        let l2 = (y2 + a) / (n2 + nprior - y2 - a);
        let sigmasquared = 1.0 / (y1 + a) + 1.0 / (y2 + a);
        delta.insert(word.clone(), (l1.ln() - l2.ln()) / sigmasquared.sqrt());
    }
    delta
}

/// Writes `word<TAB>score` lines sorted ascending by score.
pub fn write_scores<W: Write>(out: &mut W, delta: &HashMap<String, f64>) -> Result<(), String> {
    let mut sorted: Vec<(&String, &f64)> = delta.iter().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)));
    for (word, score) in sorted {
        writeln!(out, "{word}\t{score:.3}").map_err(|e| format!("Write scores failed: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, f64)]) -> Counts {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn load_counts_applies_min_count_and_stopwords() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.tok");
        fs::write(&path, "the cat sat the mat the cat").unwrap();

        let mut stop = HashSet::new();
        stop.insert("the".to_string());
        let counts = load_counts(&path, 2, &stop).unwrap();

        assert_eq!(counts.get("cat"), Some(&2.0));
        assert!(!counts.contains_key("the"));
        assert!(!counts.contains_key("sat"));
    }

    #[test]
    fn overrepresented_word_scores_positive() {
        let c1 = counts(&[("shared", 50.0), ("first", 60.0)]);
        let c2 = counts(&[("shared", 50.0), ("second", 60.0)]);
        let prior = counts(&[("shared", 100.0), ("first", 60.0), ("second", 60.0)]);

        let delta = compute_log_odds(c1, c2, prior);
        assert!(delta["first"] > 0.0);
        assert!(delta["second"] < 0.0);
        assert!(delta["shared"].abs() < delta["first"].abs());
    }

    #[test]
    fn words_absent_from_prior_still_get_scores() {
        // "novel" only exists in the first corpus; the prior floor of one
        // keeps its denominator finite.
        let c1 = counts(&[("novel", 30.0), ("shared", 10.0)]);
        let c2 = counts(&[("shared", 10.0)]);
        let prior = counts(&[("shared", 20.0)]);

        let delta = compute_log_odds(c1, c2, prior);
        assert!(delta["novel"].is_finite());
        assert!(delta["novel"] > 0.0);
    }

    #[test]
    fn scores_write_sorted_ascending() {
        let mut delta = HashMap::new();
        delta.insert("b".to_string(), 1.25);
        delta.insert("a".to_string(), -2.5);
        let mut out = Vec::new();
        write_scores(&mut out, &delta).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\t-2.500\nb\t1.250\n");
    }

    #[test]
    fn symmetric_corpora_give_opposite_scores() {
        let c1 = counts(&[("x", 40.0), ("y", 10.0)]);
        let c2 = counts(&[("x", 10.0), ("y", 40.0)]);
        let prior = counts(&[("x", 50.0), ("y", 50.0)]);
        let delta = compute_log_odds(c1, c2, prior);
        assert!((delta["x"] + delta["y"]).abs() < 1e-9);
    }
}
