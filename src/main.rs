#![forbid(unsafe_code)]
//! # Code-Switching Analysis CLI
//!
//! Command-line driver for the `codeswitch_analysis` crate. Each
//! subcommand is one batch step of the study pipeline; steps communicate
//! only through the files they read and write.
//!
//! ## Example
//! ```bash
//! cargo run --release -- crawl subreddits.txt --out-dir allposts
//! cargo run --release -- extract countries.txt --posts-dir allposts --out cs_posts.csv
//! cargo run --release -- log-odds --first informal.tok --second formal.tok --prior background.tok
//! ```
//!
//! See `--help` for all options.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::error;

use codeswitch_analysis::crawl::{self, CrawlOptions, DEFAULT_ENDPOINT, MAX_RETRIEVED_ELEMENTS, RetrievalType};
use codeswitch_analysis::extract::{self, ExtractOptions};
use codeswitch_analysis::formality::{self, FormalityOptions, LOG_ODDS_THRESHOLD};
use codeswitch_analysis::logodds;
use codeswitch_analysis::proficiency::{self, ProficiencyOptions, Stage};
use codeswitch_analysis::translation;
use codeswitch_analysis::words::load_wordlist;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl all posts of the listed subreddits into JSON-lines files
    Crawl {
        /// File with subreddit names, one per line
        subreddits: PathBuf,

        /// Retrieve comments or submissions
        #[arg(long, value_enum, default_value_t = RetrievalType::Comment)]
        retrieval_type: RetrievalType,

        /// Directory for the per-subreddit output files
        #[arg(long, default_value = "allposts")]
        out_dir: PathBuf,

        /// Archive API endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Elements per page request
        #[arg(long, default_value_t = MAX_RETRIEVED_ELEMENTS)]
        page_size: usize,
    },

    /// Detect code-switched posts per country and export them as CSV
    Extract {
        /// File with country names, one per line
        countries: PathBuf,

        /// Directory with crawled `{country}.{type}.json.out` files
        #[arg(long, default_value = "allposts")]
        posts_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = RetrievalType::Comment)]
        retrieval_type: RetrievalType,

        /// Translation-marker lexicon; posts containing a marker are dropped
        #[arg(long)]
        translation_words: Option<PathBuf>,

        /// Worker pool size for the per-country fan-out
        #[arg(long, default_value_t = 8)]
        workers: usize,

        /// Output CSV of code-switched posts
        #[arg(long, default_value = "codeswitch_posts.csv")]
        out: PathBuf,
    },

    /// Find words indicating that a post is a translation post
    TranslationWords {
        /// CSV of known translation posts
        translation_posts: PathBuf,

        /// CSV of candidate code-switch posts
        cs_posts: PathBuf,

        /// Dictionary wordlist of common English words
        #[arg(long)]
        dictionary: PathBuf,

        /// How many top-ranked words to keep
        #[arg(long, default_value_t = 50)]
        top: usize,

        /// Output CSV of `word,score` rows
        #[arg(long, default_value = "translation_prob.csv")]
        out: PathBuf,
    },

    /// Weighted log-odds-ratio with informative Dirichlet prior
    LogOdds {
        /// First token-count corpus
        #[arg(short, long)]
        first: PathBuf,

        /// Second token-count corpus
        #[arg(short, long)]
        second: PathBuf,

        /// Prior (background) corpus
        #[arg(short, long)]
        prior: PathBuf,

        /// Output file; stdout when omitted
        #[arg(long)]
        out_file: Option<PathBuf>,

        /// Minimum count for prior tokens
        #[arg(long, default_value_t = 0)]
        min_count: u64,

        /// Optional stopword file (whitespace separated)
        #[arg(long)]
        stopwords: Option<PathBuf>,
    },

    /// Informality marker analysis of code-switched vs. monolingual texts
    Formality {
        /// `word<TAB>score` log-odds listing of formality markers
        #[arg(long)]
        markers: PathBuf,

        /// CSV of code-switched posts
        #[arg(long)]
        cs: PathBuf,

        /// CSV of monolingual English posts by the same author population
        #[arg(long)]
        mono: PathBuf,

        /// Word-frequency rank list (one word per line, most frequent first)
        #[arg(long)]
        ranks: PathBuf,

        #[arg(long, default_value = "snapshots")]
        snapshot_dir: PathBuf,

        /// Score below which a token counts as an informality marker
        #[arg(long, default_value_t = LOG_ODDS_THRESHOLD)]
        threshold: f64,
    },

    /// Lexical and grammatical proficiency metrics with rank-sum tests
    Proficiency {
        /// CSV of posts by frequent code-switchers
        #[arg(long)]
        cs: PathBuf,

        /// CSV of posts by monolingual users
        #[arg(long)]
        mono: PathBuf,

        /// Word-frequency rank list (one word per line, most frequent first)
        #[arg(long)]
        ranks: PathBuf,

        /// Concreteness ratings CSV (word, score)
        #[arg(long)]
        concreteness: PathBuf,

        /// Age-of-acquisition ratings CSV (word, _, score)
        #[arg(long)]
        aoa: PathBuf,

        #[arg(long, default_value = "snapshots")]
        snapshot_dir: PathBuf,

        /// Pipeline stage to run
        #[arg(long, value_enum, default_value_t = Stage::All)]
        stage: Stage,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Crawl { subreddits, retrieval_type, out_dir, endpoint, page_size } => {
            let opts = CrawlOptions { endpoint, retrieval_type, out_dir, page_size };
            crawl::run(&subreddits, &opts)
        }
        Command::Extract {
            countries,
            posts_dir,
            retrieval_type,
            translation_words,
            workers,
            out,
        } => {
            let opts = ExtractOptions { posts_dir, retrieval_type, translation_words, workers };
            extract::run(&countries, &opts, &out)
        }
        Command::TranslationWords { translation_posts, cs_posts, dictionary, top, out } => {
            translation::run(&translation_posts, &cs_posts, &dictionary, top, &out)
        }
        Command::LogOdds { first, second, prior, out_file, min_count, stopwords } => {
            let stop = match stopwords {
                Some(path) => load_wordlist(&path)?,
                None => HashSet::new(),
            };
            let counts1 = logodds::load_counts(&first, 0, &stop)?;
            let counts2 = logodds::load_counts(&second, 0, &stop)?;
            let prior = logodds::load_counts(&prior, min_count, &stop)?;
            let delta = logodds::compute_log_odds(counts1, counts2, prior);
            match out_file {
                Some(path) => {
                    let file = File::create(&path)
                        .map_err(|e| format!("Create {} failed: {e}", path.display()))?;
                    let mut out = BufWriter::new(file);
                    logodds::write_scores(&mut out, &delta)?;
                    out.flush().map_err(|e| format!("Flush {} failed: {e}", path.display()))
                }
                None => logodds::write_scores(&mut io::stdout().lock(), &delta),
            }
        }
        Command::Formality { markers, cs, mono, ranks, snapshot_dir, threshold } => {
            let opts = FormalityOptions {
                markers_file: markers,
                cs_csv: cs,
                mono_csv: mono,
                ranks_file: ranks,
                snapshot_dir,
                threshold,
            };
            formality::run(&opts)
        }
        Command::Proficiency { cs, mono, ranks, concreteness, aoa, snapshot_dir, stage } => {
            let opts = ProficiencyOptions {
                cs_csv: cs,
                mono_csv: mono,
                ranks_file: ranks,
                concreteness_file: concreteness,
                aoa_file: aoa,
                snapshot_dir,
                stage,
            };
            proficiency::run(&opts)
        }
    }
}
