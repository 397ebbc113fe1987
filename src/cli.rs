//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bookmatch_core::catalog::DEFAULT_LIST_LIMIT;
use bookmatch_core::search::{DEFAULT_MAX_PAGES, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE};
use bookmatch_core::{ConfigError, SearchRequest, SearchTarget, SortOrder};

/// Collect book metadata from the Kakao book search API.
///
/// Searches are paginated and retried, duplicate hits are collapsed by ISBN,
/// and results are exported to JSON/CSV or kept in a local SQLite catalog.
#[derive(Parser, Debug)]
#[command(name = "bookmatch")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search and write deduplicated results to JSON and CSV files
    Fetch(FetchArgs),
    /// Search and store deduplicated results in the database
    Import(ImportArgs),
    /// Show the most recently stored books
    List(ListArgs),
}

/// Field the query is matched against.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArg {
    Title,
    Isbn,
    Publisher,
    Person,
}

impl From<TargetArg> for SearchTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Title => Self::Title,
            TargetArg::Isbn => Self::Isbn,
            TargetArg::Publisher => Self::Publisher,
            TargetArg::Person => Self::Person,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Accuracy,
    Latest,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Accuracy => Self::Accuracy,
            SortArg::Latest => Self::Latest,
        }
    }
}

/// Search flags shared by `fetch` and `import`.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search query
    #[arg(long)]
    pub query: String,

    /// Field to search
    #[arg(long, value_enum, default_value_t = TargetArg::Title)]
    pub target: TargetArg,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = SortArg::Accuracy)]
    pub sort: SortArg,

    /// Results per page (1-50)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub size: u32,

    /// Maximum number of pages to request
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Maximum retries per page for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,
}

impl SearchArgs {
    /// Validated search request.
    pub fn to_request(&self) -> Result<SearchRequest, ConfigError> {
        SearchRequest::new(
            self.query.clone(),
            self.target.into(),
            self.sort.into(),
            self.size,
            self.max_pages,
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Directory for the exported files (created if missing)
    #[arg(long, default_value = "./out")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// SQLite database file (overrides BOOKMATCH_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Number of books to show (1-100)
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIST_LIMIT, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,

    /// Print books as JSON
    #[arg(long)]
    pub json: bool,

    /// SQLite database file (overrides BOOKMATCH_DB)
    #[arg(long)]
    pub db: Option<PathBuf>,
}
