//! Bilingual ("code-switch") post detection.
//!
//! A post counts as code-switched when two distinct languages each hold a
//! sufficient share of it and one of the two is English. Detection runs
//! `whatlang` over overlapping word windows of the cleaned text and
//! aggregates per-window votes weighted by detection confidence, so a
//! switch anywhere in the post surfaces as a second language with a
//! non-trivial share.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use whatlang::Lang;

/// Window width in tokens for per-window language detection.
const WINDOW_TOKENS: usize = 12;
/// Step between window starts; overlap covers switch points.
const WINDOW_STRIDE: usize = 6;
/// Minimum tokens for detection to be attempted at all.
const MIN_TOKENS: usize = 5;
/// Minimum share of windows the secondary language must hold.
const MIN_SECONDARY_SHARE: f64 = 0.15;
/// Quoted spans longer than this many words are dropped as cited material.
const MAX_QUOTE_WORDS: usize = 5;

/// Languages whatlang tends to report spuriously on short noisy text;
/// posts resolving to any of these are discarded.
pub static SUPPRESSED_LANG_CODES: &[&str] = &["epo", "lat", "afr", "tgl"];

static QUOTE_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)&gt;.*").expect("quote-reply pattern"));
static HTML_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[^;\s]*;").expect("entity pattern"));
static SUBREDDIT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\br/\S+").expect("subreddit-ref pattern"));
static USER_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bu/\S+").expect("user-ref pattern"));
static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\"[^\"]*\"").expect("quoted-span pattern"));

/// The two dominant languages of a post.
#[derive(Debug, Clone, PartialEq)]
pub struct LangPair {
    pub lang1: String,
    pub lang2: String,
    /// Share of the secondary language, percent.
    pub confidence: f64,
}

/// Decides whether `raw_text` is a code-switched post.
///
/// Returns `None` for posts that are monolingual, too short or noisy to
/// judge, contain links, or look like translations (any token in
/// `translation_markers`).
pub fn find_langs(
    raw_text: &str,
    translation_markers: Option<&HashSet<String>>,
) -> Option<LangPair> {
    // Posts with links are too noisy to clean reliably.
    if raw_text.contains("http") {
        return None;
    }
    let clean = clean_text(raw_text);
    if let Some(markers) = translation_markers {
        if is_translation(&clean, markers) {
            return None;
        }
    }
    detect_language_mix(&clean)
}

/// Strips Reddit markup and citation noise before language detection:
/// quoted reply lines, HTML entities, subreddit/user references,
/// non-printable characters, long quoted spans, and multi-word proper-name
/// runs.
pub fn clean_text(text: &str) -> String {
    let mut cleaned = QUOTE_REPLY.replace_all(text, " ").into_owned();
    cleaned = HTML_ENTITY.replace_all(&cleaned, " ").into_owned();
    cleaned = SUBREDDIT_REF.replace_all(&cleaned, " ").into_owned();
    cleaned = USER_REF.replace_all(&cleaned, " ").into_owned();
    cleaned = cleaned.chars().filter(|c| !c.is_control()).collect();

    let quoted: Vec<String> = QUOTED_SPAN
        .find_iter(&cleaned)
        .map(|m| m.as_str().to_string())
        .collect();
    for span in quoted {
        if span.split_whitespace().count() > MAX_QUOTE_WORDS {
            cleaned = cleaned.replace(&span, " ");
        }
    }

    strip_proper_name_runs(&cleaned)
}

/// True when any alphabetic token of the text is a known translation
/// marker ("translation", "means", language names, ...), indicating the
/// post translates content rather than switching languages.
pub fn is_translation(text: &str, markers: &HashSet<String>) -> bool {
    text.split_whitespace()
        .filter(|token| token.chars().all(char::is_alphabetic))
        .any(|token| markers.contains(&token.to_lowercase()))
}

/// Windowed language vote. Returns the two dominant languages when the
/// text is genuinely bilingual with English on one side.
pub fn detect_language_mix(text: &str) -> Option<LangPair> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return None;
    }

    let mut weights: HashMap<Lang, f64> = HashMap::new();
    let mut total = 0.0;
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + WINDOW_TOKENS).min(tokens.len());
        let window = tokens[start..end].join(" ");
        if let Some(info) = whatlang::detect(&window) {
            if info.is_reliable() {
                *weights.entry(info.lang()).or_insert(0.0) += info.confidence();
                total += info.confidence();
            }
        }
        if end == tokens.len() {
            break;
        }
        start += WINDOW_STRIDE;
    }
    if total == 0.0 {
        return None;
    }

    let mut ranked: Vec<(Lang, f64)> = weights.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.code().cmp(b.0.code())));

    let (lang1, _) = ranked[0];
    let (lang2, weight2) = *ranked.get(1)?;
    if weight2 / total < MIN_SECONDARY_SHARE {
        return None;
    }
    // Only posts mixing English with another language are of interest.
    if lang1 != Lang::Eng && lang2 != Lang::Eng {
        return None;
    }
    if SUPPRESSED_LANG_CODES.contains(&lang1.code()) || SUPPRESSED_LANG_CODES.contains(&lang2.code())
    {
        return None;
    }

    Some(LangPair {
        lang1: lang1.eng_name().to_string(),
        lang2: lang2.eng_name().to_string(),
        confidence: weight2 / total * 100.0,
    })
}

// Runs of two or more capitalized words are almost always proper names
// ("New York", "Armia Krajowa"); single capitalized words stay, since
// several languages capitalize ordinary nouns.
fn strip_proper_name_runs(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut keep = vec![true; tokens.len()];
    let mut i = 0;
    while i < tokens.len() {
        let mut j = i;
        while j < tokens.len() && looks_capitalized(tokens[j]) {
            j += 1;
        }
        if j - i >= 2 {
            for flag in keep.iter_mut().take(j).skip(i) {
                *flag = false;
            }
        }
        i = j.max(i + 1);
    }
    tokens
        .iter()
        .zip(&keep)
        .filter(|(_, keep)| **keep)
        .map(|(token, _)| *token)
        .collect::<Vec<_>>()
        .join(" ")
}

// Capitalized word with a lowercase remainder; all-caps tokens are
// acronyms, not names, and one-letter tokens ("I") never match.
fn looks_capitalized(token: &str) -> bool {
    let trimmed = token.trim_matches(|c: char| !c.is_alphabetic());
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {
            let rest: Vec<char> = chars.collect();
            !rest.is_empty() && rest.iter().all(|c| c.is_lowercase())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_reply_quotes_and_refs() {
        let raw = "&gt; quoted reply line\nyo check r/france and u/someone_else okay";
        let clean = clean_text(raw);
        assert!(!clean.contains("quoted"));
        assert!(!clean.contains("r/france"));
        assert!(!clean.contains("u/someone_else"));
        assert!(clean.contains("check"));
        assert!(clean.contains("okay"));
    }

    #[test]
    fn clean_drops_entities_and_long_quotes() {
        let raw = "before &amp; after \"a very long quoted passage of many words here\" end";
        let clean = clean_text(raw);
        assert!(!clean.contains("&amp;"));
        assert!(!clean.contains("quoted passage"));
        assert!(clean.contains("before"));
        assert!(clean.contains("end"));
    }

    #[test]
    fn clean_keeps_short_quotes() {
        let clean = clean_text("she said \"no way\" twice");
        assert!(clean.contains("no way"));
    }

    #[test]
    fn proper_name_runs_are_stripped() {
        let clean = clean_text("i visited New York City last summer");
        assert!(!clean.contains("New York"));
        assert!(clean.contains("last summer"));
        // single capitalized tokens survive
        let kept = clean_text("das Haus ist sehr gross und alt");
        assert!(kept.contains("Haus"));
    }

    #[test]
    fn translation_posts_are_flagged() {
        let mut markers = HashSet::new();
        markers.insert("translation".to_string());
        assert!(is_translation("rough translation of the song", &markers));
        assert!(!is_translation("just a normal comment", &markers));
    }

    #[test]
    fn links_short_texts_and_monolingual_posts_are_rejected() {
        assert!(find_langs("see http://example.com il est la", None).is_none());
        assert!(find_langs("ok", None).is_none());
        let english = "this is a perfectly ordinary english sentence about the weather today \
                       and it continues with more plain english words about nothing else";
        assert!(find_langs(english, None).is_none());
    }

    #[test]
    fn bilingual_text_reports_both_languages() {
        let mixed = "honestly the meeting today went much better than anyone expected it would \
                     and everyone seemed genuinely pleased with the outcome of the discussion \
                     pero despues de la reunion tuvimos que caminar hasta la estacion porque \
                     los autobuses estaban completamente llenos de gente cansada";
        let pair = find_langs(mixed, None).expect("mixed text should be detected");
        let langs = [pair.lang1.as_str(), pair.lang2.as_str()];
        assert!(langs.contains(&"English"));
        assert!(langs.contains(&"Spanish"));
        assert!(pair.confidence > 0.0 && pair.confidence < 100.0);
    }
}
