//! Tokenization and lexicon loading shared by the analysis commands.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

/// English function words (articles, pronouns, prepositions, conjunctions,
/// auxiliaries, common adverbial qualifiers). Used to separate content from
/// grammatical tokens in the lexical metrics and the translation-word filter.
pub static FUNCTION_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "again", "against", "all", "almost", "alone",
    "along", "already", "also", "although", "always", "am", "among", "an", "and", "another",
    "any", "anybody", "anyone", "anything", "anywhere", "are", "aren't", "around", "as", "at",
    "be", "because", "been", "before", "behind", "being", "below", "beside", "between", "beyond",
    "both", "but", "by", "can", "cannot", "can't", "could", "couldn't", "did", "didn't", "do",
    "does", "doesn't", "doing", "done", "don't", "down", "during", "each", "either", "enough",
    "even", "ever", "every", "everybody", "everyone", "everything", "everywhere", "few", "for",
    "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having", "he",
    "he'd", "he'll", "her", "here", "hers", "herself", "he's", "him", "himself", "his", "how",
    "however", "i", "i'd", "if", "i'll", "i'm", "in", "into", "is", "isn't", "it", "its",
    "it's", "itself", "i've", "just", "least", "less", "like", "many", "may", "me", "might",
    "mine", "more", "most", "much", "must", "mustn't", "my", "myself", "near", "neither",
    "never", "no", "nobody", "none", "nor", "not", "nothing", "now", "nowhere", "of", "off",
    "often", "on", "once", "one", "only", "onto", "or", "other", "others", "our", "ours",
    "ourselves", "out", "over", "own", "per", "quite", "rather", "really", "same", "shall",
    "she", "she'd", "she'll", "she's", "should", "shouldn't", "since", "so", "some", "somebody",
    "someone", "something", "sometimes", "somewhere", "still", "such", "than", "that", "that's",
    "the", "their", "theirs", "them", "themselves", "then", "there", "therefore", "these",
    "they", "they'd", "they'll", "they're", "they've", "this", "those", "though", "through",
    "throughout", "thus", "to", "together", "too", "toward", "towards", "under", "until", "unto",
    "up", "upon", "us", "very", "was", "wasn't", "we", "we'd", "well", "we'll", "we're", "were",
    "weren't", "we've", "what", "whatever", "when", "whenever", "where", "wherever", "whether",
    "which", "while", "who", "whoever", "whom", "whose", "why", "will", "with", "within",
    "without", "won't", "would", "wouldn't", "yet", "you", "you'd", "you'll", "your", "you're",
    "yours", "yourself", "yourselves", "you've",
];

/// Function words as a set for membership checks.
pub fn function_words() -> HashSet<&'static str> {
    FUNCTION_WORDS.iter().copied().collect()
}

/// Splits a text into lowercased word tokens, stripping punctuation.
///
/// # Example
/// ```
/// use codeswitch_analysis::words::tokenize;
/// let tokens = tokenize("Wait, what?! (really)");
/// assert_eq!(tokens, vec!["wait", "what", "really"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(
            &[
                '(', ')', ',', '"', '.', ';', ':', '=', '[', ']', '{', '}', '-', '_', '/', '\\',
                '’', '?', '!', '“', '”', '‘', '*', '~', '<', '>', '#', '&', '%', '@', '+', '|',
            ][..],
            " ",
        )
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Reads a wordlist file (one entry per line, blank lines skipped) into a set.
/// Used for stopwords, dictionary wordlists, and marker lexicons.
pub fn load_wordlist(path: &Path) -> Result<HashSet<String>, String> {
    let file = File::open(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut words = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        for word in line.split_whitespace() {
            words.insert(word.to_string());
        }
    }
    Ok(words)
}

/// Reads the first whitespace column of each line, preserving file order.
/// Used for country/subreddit lists where order matters for reporting.
pub fn load_list(path: &Path) -> Result<Vec<String>, String> {
    let file = File::open(path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        if let Some(first) = line.split_whitespace().next() {
            entries.push(first.to_string());
        }
    }
    Ok(entries)
}

/// Loads a word-frequency rank table from a wordlist ordered by corpus
/// frequency: rank 1 is the most frequent word.
pub fn load_ranks(path: &Path) -> Result<HashMap<String, usize>, String> {
    let entries = load_list(path)?;
    let mut ranks = HashMap::with_capacity(entries.len());
    for (index, word) in entries.into_iter().enumerate() {
        ranks.entry(word).or_insert(index + 1);
    }
    info!("loaded {} word ranks", ranks.len());
    Ok(ranks)
}

/// Loads a word-to-score table from a ratings CSV with a header row.
/// `score_column` selects which column carries the score (the word is always
/// column 0); rows that are too short or carry a non-numeric score are
/// skipped, matching the tolerant readers used for the published ratings
/// files (concreteness, age of acquisition).
pub fn load_scored_lexicon(path: &Path, score_column: usize) -> Result<HashMap<String, f64>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("Open {} failed: {e}", path.display()))?;
    let mut scores = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("Read {} failed: {e}", path.display()))?;
        if record.len() <= score_column {
            continue;
        }
        let word = record[0].trim().to_string();
        if let Ok(score) = record[score_column].trim().parse::<f64>() {
            scores.insert(word, score);
        }
    }
    info!("loaded {} scored entries from {}", scores.len(), path.display());
    Ok(scores)
}
