//! Country-subreddit lists used to include or exclude communities.

/// Countries whose subreddits are majority English; excluded from
/// code-switch extraction since bilingual posts there are rare and noisy.
pub static ENGLISH_COUNTRIES: &[&str] = &["Canada", "US", "Australia", "UK", "NewZealand"];

/// Lowercased names of country-specific subreddits. Posts made in these
/// communities are dropped from the proficiency analysis so that the
/// comparison covers only topic subreddits shared by both user groups.
pub static COUNTRY_SUBREDDITS: &[&str] = &[
    "argentina", "australia", "austria", "bangladesh", "belgium", "brasil", "brazil", "bulgaria",
    "canada", "chile", "china", "colombia", "croatia", "czech", "denmark", "ecuador", "egypt",
    "estonia", "finland", "france", "germany", "greece", "hungary", "iceland", "india",
    "indonesia", "iran", "ireland", "israel", "italy", "japan", "korea", "latvia", "lithuania",
    "malaysia", "mexico", "morocco", "nepal", "netherlands", "newzealand", "nigeria", "norway",
    "pakistan", "peru", "philippines", "poland", "portugal", "romania", "russia", "serbia",
    "singapore", "slovakia", "slovenia", "southafrica", "spain", "srilanka", "sweden",
    "switzerland", "thailand", "tunisia", "turkey", "ukraine", "unitedkingdom", "uruguay", "usa",
    "venezuela", "vietnam",
];

/// True when the subreddit names a country community (case-insensitive).
pub fn is_country_subreddit(subreddit: &str) -> bool {
    COUNTRY_SUBREDDITS.contains(&subreddit.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_subreddits_match_case_insensitively() {
        assert!(is_country_subreddit("France"));
        assert!(is_country_subreddit(" germany "));
        assert!(!is_country_subreddit("AskReddit"));
    }
}
