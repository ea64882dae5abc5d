//! Lexical and grammatical proficiency metrics, per author, for
//! code-switchers vs. monolingual users.
//!
//! The pipeline runs in four stages, each persisting its result as a
//! snapshot so the expensive parts can be inspected and rerun
//! independently: `load` groups posts by author, `clean` keeps only
//! confidently-English sentences, `metrics` computes per-author metric
//! vectors, and `report` prints group means with a rank-sum test per
//! metric.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::ValueEnum;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use whatlang::Lang;

use crate::countries::is_country_subreddit;
use crate::post::read_posts_csv;
use crate::snapshot::Snapshots;
use crate::stats;
use crate::words::{function_words, load_ranks, load_scored_lexicon, tokenize};

/// Tokens ranked beyond this are out-of-vocabulary and ignored.
pub const MAX_WORD_RANK: usize = 10_000;
/// Minimum posts an author needs to enter the metric computation.
pub const MIN_POSTS_FOR_TEST: usize = 50;
/// Window width for the moving-average type-token ratio.
pub const STTR_WINDOW: usize = 1000;
/// Language-detector confidence needed to keep a sentence as English.
pub const DETECTOR_CONFIDENCE: f64 = 0.9;
/// Sentences outside this token range are skipped by the grammatical pass.
pub const SENTENCE_TOKEN_RANGE: (usize, usize) = (3, 70);
/// At most this many sentences per author enter the clause scan.
pub const SENTENCE_CAP: usize = 500;
/// Sentences shorter than this are not worth language-detecting.
const MIN_CLEAN_SENTENCE_TOKENS: usize = 10;

pub const DATA_CS: &str = "data.cs.by.author";
pub const DATA_MONOLINGUAL: &str = "data.monolingual.by.author";
pub const METRICS_CS: &str = "metrics.cs.by.author";
pub const METRICS_MONOLINGUAL: &str = "metrics.monolingual.by.author";

static SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.|!\s|\?\s|\n").expect("sentence-split pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Subordinators and relative pronouns that open a finite clause; the
/// clause scan uses them as a parser-free estimate of clause structure.
static CLAUSE_MARKERS: &[&str] = &[
    "after", "although", "because", "before", "how", "if", "once", "since", "that", "though",
    "unless", "until", "when", "whenever", "where", "whereas", "wherever", "whether", "which",
    "while", "who", "whom", "whose", "why",
];

/// One author's metric vector. Metrics that need data the author doesn't
/// have (e.g. a thousand content tokens for the type-token ratio) stay
/// `None` and are skipped by the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorMetrics {
    pub sttr: Option<f64>,
    pub lexical_density: f64,
    pub mean_aoa: Option<f64>,
    pub mean_concreteness: Option<f64>,
    pub mean_word_length: f64,
    pub mean_clauses: Option<f64>,
    pub mean_clause_depth: Option<f64>,
    pub mean_sentence_length: Option<f64>,
}

pub static METRIC_NAMES: &[&str] = &[
    "sttr",
    "lexical density",
    "mean AoA",
    "mean concreteness",
    "mean word length",
    "mean clauses",
    "mean clause depth",
    "mean sentence length",
];

impl AuthorMetrics {
    fn values(&self) -> [Option<f64>; 8] {
        [
            self.sttr,
            Some(self.lexical_density),
            self.mean_aoa,
            self.mean_concreteness,
            Some(self.mean_word_length),
            self.mean_clauses,
            self.mean_clause_depth,
            self.mean_sentence_length,
        ]
    }
}

/// Word-score lexicons backing the lexical metrics.
pub struct Lexicons {
    pub ranks: HashMap<String, usize>,
    pub concreteness: HashMap<String, f64>,
    pub aoa: HashMap<String, f64>,
}

impl Lexicons {
    /// Loads ranks, concreteness ratings (score in column 1), and age of
    /// acquisition ratings (score in column 2).
    pub fn load(ranks: &Path, concreteness: &Path, aoa: &Path) -> Result<Self, String> {
        Ok(Self {
            ranks: load_ranks(ranks)?,
            concreteness: load_scored_lexicon(concreteness, 1)?,
            aoa: load_scored_lexicon(aoa, 2)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Load,
    Clean,
    Metrics,
    Report,
    All,
}

pub struct ProficiencyOptions {
    pub cs_csv: PathBuf,
    pub mono_csv: PathBuf,
    pub ranks_file: PathBuf,
    pub concreteness_file: PathBuf,
    pub aoa_file: PathBuf,
    pub snapshot_dir: PathBuf,
    pub stage: Stage,
}

/// Runs the requested stage (or the whole pipeline).
pub fn run(opts: &ProficiencyOptions) -> Result<(), String> {
    let store = Snapshots::new(&opts.snapshot_dir)?;
    match opts.stage {
        Stage::Load => load_stage(&store, opts),
        Stage::Clean => clean_stage(&store),
        Stage::Metrics => metrics_stage(&store, opts),
        Stage::Report => report_stage(&store),
        Stage::All => {
            load_stage(&store, opts)?;
            clean_stage(&store)?;
            metrics_stage(&store, opts)?;
            report_stage(&store)
        }
    }
}

/// Stage 1: group posts by author, dropping country-subreddit posts so the
/// comparison covers only shared topic communities.
pub fn load_stage(store: &Snapshots, opts: &ProficiencyOptions) -> Result<(), String> {
    let (data_cs, subs_cs) = read_data(&opts.cs_csv)?;
    let (data_mono, subs_mono) = read_data(&opts.mono_csv)?;
    let subreddits: HashSet<&String> = subs_cs.union(&subs_mono).collect();

    store.save(DATA_CS, &data_cs)?;
    store.save(DATA_MONOLINGUAL, &data_mono)?;
    info!(
        "code-switchers: {}, non-code-switchers: {}, total subreddits: {}",
        data_cs.len(),
        data_mono.len(),
        subreddits.len()
    );
    Ok(())
}

/// Stage 2: keep only confidently-English sentences of every post.
pub fn clean_stage(store: &Snapshots) -> Result<(), String> {
    for name in [DATA_CS, DATA_MONOLINGUAL] {
        let data: HashMap<String, Vec<String>> = store.load(name)?;
        let clean = filter_english_posts(&data);
        info!("{name}: {} of {} authors kept after cleaning", clean.len(), data.len());
        store.save(&format!("{name}.clean"), &clean)?;
    }
    Ok(())
}

/// Stage 3: per-author metric vectors for both groups.
pub fn metrics_stage(store: &Snapshots, opts: &ProficiencyOptions) -> Result<(), String> {
    let lexicons = Lexicons::load(&opts.ranks_file, &opts.concreteness_file, &opts.aoa_file)?;
    for (data_name, metrics_name) in
        [(DATA_CS, METRICS_CS), (DATA_MONOLINGUAL, METRICS_MONOLINGUAL)]
    {
        let data: HashMap<String, Vec<String>> = store.load(&format!("{data_name}.clean"))?;
        let metrics = extract_metrics(&data, &lexicons);
        info!("{metrics_name}: metrics for {} authors", metrics.len());
        store.save(metrics_name, &metrics)?;
    }
    Ok(())
}

/// Stage 4: group means, standard errors, and a rank-sum test per metric.
pub fn report_stage(store: &Snapshots) -> Result<(), String> {
    let cs: HashMap<String, AuthorMetrics> = store.load(METRICS_CS)?;
    let mono: HashMap<String, AuthorMetrics> = store.load(METRICS_MONOLINGUAL)?;
    let cs_columns = metric_columns(&cs);
    let mono_columns = metric_columns(&mono);

    println!("metric\tcs mean\tcs sem\tmono mean\tmono sem\tp-value");
    for (index, name) in METRIC_NAMES.iter().enumerate() {
        let cs_values = &cs_columns[index];
        let mono_values = &mono_columns[index];
        let p = match stats::rank_sum(cs_values, mono_values) {
            Ok((_, p)) => format!("{p:.6}"),
            Err(_) => "n/a".to_string(),
        };
        println!(
            "{name}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{p}",
            stats::mean(cs_values),
            stats::sem(cs_values),
            stats::mean(mono_values),
            stats::sem(mono_values),
        );
    }
    Ok(())
}

/// Author-to-texts map from a posts CSV, excluding country subreddits.
/// Also returns the distinct non-country subreddits seen.
pub fn read_data(
    path: &Path,
) -> Result<(HashMap<String, Vec<String>>, HashSet<String>), String> {
    let mut data: HashMap<String, Vec<String>> = HashMap::new();
    let mut subreddits = HashSet::new();
    for post in read_posts_csv(path)? {
        if is_country_subreddit(&post.subreddit) {
            continue;
        }
        subreddits.insert(post.subreddit.trim().to_string());
        data.entry(post.author.trim().to_string())
            .or_default()
            .push(post.text.trim().to_string());
    }
    Ok((data, subreddits))
}

/// Keeps, per post, only sentences of at least ten tokens that detect as
/// English with high confidence; drops posts and authors left empty.
pub fn filter_english_posts(
    data: &HashMap<String, Vec<String>>,
) -> HashMap<String, Vec<String>> {
    let mut clean: HashMap<String, Vec<String>> = HashMap::new();
    for (author, posts) in data {
        debug!("processing: {author}");
        let mut kept_posts = Vec::new();
        for post in posts {
            let sentences: Vec<String> = split_sentences(post)
                .into_iter()
                .filter(|sentence| sentence.split_whitespace().count() >= MIN_CLEAN_SENTENCE_TOKENS)
                .filter(|sentence| is_confident_english(sentence))
                .collect();
            if !sentences.is_empty() {
                kept_posts.push(sentences.join(". "));
            }
        }
        if !kept_posts.is_empty() {
            clean.insert(author.clone(), kept_posts);
        }
    }
    clean
}

fn is_confident_english(sentence: &str) -> bool {
    match whatlang::detect(sentence) {
        Some(info) => info.lang() == Lang::Eng && info.confidence() > DETECTOR_CONFIDENCE,
        None => false,
    }
}

/// Metric vectors for every author with enough cleaned posts.
pub fn extract_metrics(
    data: &HashMap<String, Vec<String>>,
    lexicons: &Lexicons,
) -> HashMap<String, AuthorMetrics> {
    let mut metrics = HashMap::new();
    for (author, posts) in data {
        if posts.len() < MIN_POSTS_FOR_TEST {
            continue;
        }
        if let Some(vector) = compute_metrics(posts, lexicons) {
            debug!("{author}: {vector:?}");
            metrics.insert(author.clone(), vector);
        }
    }
    metrics
}

/// Concatenates an author's posts and computes the full metric vector.
/// Returns `None` when no in-vocabulary tokens remain.
pub fn compute_metrics(texts: &[String], lexicons: &Lexicons) -> Option<AuthorMetrics> {
    let function = function_words();
    let mut clean_tokens = Vec::new();
    let mut content_tokens = Vec::new();
    for token in tokenize(&texts.join(" ")) {
        if lexicons.ranks.get(&token).copied().unwrap_or(usize::MAX) > MAX_WORD_RANK {
            continue;
        }
        if !token.chars().all(char::is_alphabetic) {
            continue;
        }
        let is_function = function.contains(token.as_str());
        clean_tokens.push(token.clone());
        if !is_function {
            content_tokens.push(token);
        }
    }
    if clean_tokens.is_empty() || content_tokens.is_empty() {
        return None;
    }

    let sentences = collect_sentences(texts);
    let (mean_clauses, mean_clause_depth) = match clause_statistics(&sentences) {
        Some((clauses, depth)) => (Some(clauses), Some(depth)),
        None => (None, None),
    };

    Some(AuthorMetrics {
        sttr: moving_average_ttr(&content_tokens),
        lexical_density: content_tokens.len() as f64 / clean_tokens.len() as f64,
        mean_aoa: mean_score(&content_tokens, &lexicons.aoa),
        mean_concreteness: mean_score(&content_tokens, &lexicons.concreteness),
        mean_word_length: mean_word_length(&content_tokens),
        mean_clauses,
        mean_clause_depth,
        mean_sentence_length: mean_sentence_length(&sentences),
    })
}

/// Moving-average type-token ratio over fixed windows of content tokens;
/// `None` for authors with fewer than [`STTR_WINDOW`] + 1 tokens.
pub fn moving_average_ttr(tokens: &[String]) -> Option<f64> {
    if tokens.len() < STTR_WINDOW {
        return None;
    }
    let mut ratios = Vec::new();
    let mut start = 0;
    while start + STTR_WINDOW < tokens.len() {
        let window = &tokens[start..start + STTR_WINDOW];
        let distinct: HashSet<&String> = window.iter().collect();
        ratios.push(distinct.len() as f64 / STTR_WINDOW as f64);
        start += STTR_WINDOW;
    }
    if ratios.is_empty() {
        return None;
    }
    Some(stats::mean(&ratios))
}

/// Mean token length in characters.
pub fn mean_word_length(tokens: &[String]) -> f64 {
    let total: usize = tokens.iter().map(|t| t.chars().count()).sum();
    total as f64 / tokens.len() as f64
}

/// Mean lexicon score over the tokens that carry a rating.
pub fn mean_score(tokens: &[String], scores: &HashMap<String, f64>) -> Option<f64> {
    let rated: Vec<f64> = tokens.iter().filter_map(|t| scores.get(t).copied()).collect();
    if rated.is_empty() {
        return None;
    }
    Some(stats::mean(&rated))
}

/// Splits on `.`, `! `, `? `, and newlines.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT
        .split(text)
        .map(|s| WHITESPACE.replace_all(s, " ").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sentences of an author eligible for the grammatical pass: whitespace
/// normalized, within [`SENTENCE_TOKEN_RANGE`], capped at [`SENTENCE_CAP`]
/// by even-stride subsampling.
pub fn collect_sentences(texts: &[String]) -> Vec<String> {
    let (min_tokens, max_tokens) = SENTENCE_TOKEN_RANGE;
    let all: Vec<String> = split_sentences(&texts.join("\n"))
        .into_iter()
        .filter(|sentence| {
            let count = sentence.split_whitespace().count();
            count >= min_tokens && count <= max_tokens
        })
        .collect();
    if all.len() <= SENTENCE_CAP {
        return all;
    }
    let step = all.len().div_ceil(SENTENCE_CAP);
    all.into_iter().step_by(step).collect()
}

/// Mean clause count and mean clause-embedding depth over the sentences;
/// `None` when there are no sentences to scan.
pub fn clause_statistics(sentences: &[String]) -> Option<(f64, f64)> {
    if sentences.is_empty() {
        return None;
    }
    let mut clause_counts = Vec::with_capacity(sentences.len());
    let mut depths = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let (clauses, depth) = clause_metrics(sentence);
        clause_counts.push(clauses as f64);
        depths.push(depth as f64);
    }
    Some((stats::mean(&clause_counts), stats::mean(&depths)))
}

/// Estimates the clause structure of one sentence without a parser: every
/// subordinator or relative pronoun opens a clause (raising the embedding
/// depth), and clause-final punctuation closes one.
pub fn clause_metrics(sentence: &str) -> (usize, usize) {
    let mut clauses = 1usize;
    let mut depth = 1usize;
    let mut max_depth = 1usize;
    for raw in sentence.split_whitespace() {
        let token: String = raw
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
            .to_lowercase();
        if CLAUSE_MARKERS.contains(&token.as_str()) {
            clauses += 1;
            depth += 1;
            max_depth = max_depth.max(depth);
        } else if raw.ends_with([',', ';', ':']) && depth > 1 {
            depth -= 1;
        }
    }
    (clauses, max_depth)
}

/// Mean sentence length in tokens; `None` for no sentences.
pub fn mean_sentence_length(sentences: &[String]) -> Option<f64> {
    if sentences.is_empty() {
        return None;
    }
    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();
    Some(stats::mean(&lengths))
}

/// Per-metric value columns in deterministic author order, `None` entries
/// dropped.
pub fn metric_columns(metrics: &HashMap<String, AuthorMetrics>) -> [Vec<f64>; 8] {
    let mut authors: Vec<&String> = metrics.keys().collect();
    authors.sort();
    let mut columns: [Vec<f64>; 8] = std::array::from_fn(|_| Vec::new());
    for author in authors {
        for (index, value) in metrics[author].values().into_iter().enumerate() {
            if let Some(value) = value {
                columns[index].push(value);
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicons(ranked: &[&str]) -> Lexicons {
        Lexicons {
            ranks: ranked
                .iter()
                .enumerate()
                .map(|(i, w)| (w.to_string(), i + 1))
                .collect(),
            concreteness: HashMap::from([("house".to_string(), 4.9)]),
            aoa: HashMap::from([("house".to_string(), 3.7), ("idea".to_string(), 8.9)]),
        }
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn sentences_split_on_terminators_and_newlines() {
        let sentences = split_sentences("First one here. Second  one!\nThird one? Yes");
        assert_eq!(
            sentences,
            vec!["First one here", "Second one", "Third one", "Yes"]
        );
    }

    #[test]
    fn sttr_needs_a_full_window() {
        let short = strings(&["a"; 999]);
        assert!(moving_average_ttr(&short).is_none());

        // 1500 tokens: one full window of the first 1000, half distinct
        let mut tokens = Vec::new();
        for i in 0..500 {
            tokens.push(format!("word{i}"));
            tokens.push(format!("word{i}"));
        }
        tokens.extend(strings(&["tail"; 500]));
        let sttr = moving_average_ttr(&tokens).unwrap();
        assert!((sttr - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clause_metrics_count_subordination() {
        assert_eq!(clause_metrics("the cat sat on the mat"), (1, 1));
        assert_eq!(
            clause_metrics("i think that she left because he was late"),
            (3, 3)
        );
        // the comma closes the opened clause before the main one starts
        assert_eq!(clause_metrics("when he arrived, we ate dinner"), (2, 2));
        let (clauses, depth) = clause_metrics("when he arrived, we ate food that was cold");
        assert_eq!(clauses, 3);
        assert_eq!(depth, 2);
    }

    #[test]
    fn sentence_cap_subsamples_evenly() {
        let texts = vec![(0..1200)
            .map(|i| format!("sentence number {i} has five tokens."))
            .collect::<Vec<_>>()
            .join(" ")];
        let sentences = collect_sentences(&texts);
        assert!(sentences.len() <= SENTENCE_CAP);
        assert!(sentences.len() >= SENTENCE_CAP / 2);
    }

    #[test]
    fn metrics_cover_lexical_and_grammatical_fields() {
        let lex = lexicons(&["the", "house", "idea", "was", "big", "a", "new"]);
        let texts = vec!["the house was big. a new idea that was big".to_string()];
        let m = compute_metrics(&texts, &lex).unwrap();

        // content tokens: house, big, new, idea, big
        assert!(m.sttr.is_none());
        assert!((m.mean_word_length - (5 + 3 + 3 + 4 + 3) as f64 / 5.0).abs() < 1e-9);
        assert!((m.mean_concreteness.unwrap() - 4.9).abs() < 1e-9);
        assert!((m.mean_aoa.unwrap() - (3.7 + 8.9) / 2.0).abs() < 1e-9);
        assert!(m.lexical_density > 0.0 && m.lexical_density < 1.0);
        assert!(m.mean_clauses.unwrap() >= 1.0);
        assert_eq!(m.mean_sentence_length, Some(5.0));
    }

    #[test]
    fn authors_with_few_posts_are_skipped() {
        let lex = lexicons(&["hello", "world"]);
        let mut data = HashMap::new();
        data.insert("light_poster".to_string(), vec!["hello world".to_string()]);
        let metrics = extract_metrics(&data, &lex);
        assert!(metrics.is_empty());
    }

    #[test]
    fn english_filter_keeps_confident_sentences_only() {
        let mut data = HashMap::new();
        data.insert(
            "writer".to_string(),
            vec![
                "This is a long and perfectly ordinary English sentence about the weather \
                 in the north of the country today. ok"
                    .to_string(),
            ],
        );
        data.insert("noise".to_string(), vec!["asdf qwer".to_string()]);
        let clean = filter_english_posts(&data);
        assert!(clean.contains_key("writer"));
        assert!(!clean.contains_key("noise"));
    }
}
