#![forbid(unsafe_code)]
//! # Code-Switching Analysis
//!
//! Batch toolkit for a sociolinguistic study of code-switching in social
//! media text. The pipeline crawls subreddit archives, detects bilingual
//! ("code-switch") posts, and computes lexical, grammatical, and formality
//! metrics that compare code-switching users with monolingual users of the
//! same communities.
//!
//! Every step is an independent batch job connected to the next through
//! files: JSON-lines for crawled posts, CSV for post and metric exports,
//! and JSON snapshots for intermediate author-keyed state.
//!
//! - [`crawl`] — page a Pushshift-style archive API into JSON-lines files
//! - [`extract`] — detect code-switched posts, export them as CSV
//! - [`translation`] — find words indicating translation (not switching)
//! - [`logodds`] — weighted log-odds-ratio with informative Dirichlet prior
//! - [`formality`] — informality marker rates, paired signed-rank test
//! - [`proficiency`] — per-author lexical/grammatical metrics, rank-sum tests

pub mod countries;
pub mod crawl;
pub mod detect;
pub mod extract;
pub mod formality;
pub mod logodds;
pub mod post;
pub mod proficiency;
pub mod snapshot;
pub mod stats;
pub mod translation;
pub mod words;

pub use crawl::{CrawlOptions, RetrievalType};
pub use detect::{LangPair, find_langs};
pub use extract::ExtractOptions;
pub use formality::FormalityOptions;
pub use post::{Post, read_posts_csv, write_posts_csv};
pub use proficiency::{ProficiencyOptions, Stage};
pub use snapshot::Snapshots;
