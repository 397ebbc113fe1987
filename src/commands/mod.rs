//! CLI command handlers.

mod fetch;
mod import;
mod list;

pub use fetch::run_fetch_command;
pub use import::run_import_command;
pub use list::run_list_command;

use std::path::{Path, PathBuf};

use bookmatch_core::{AppConfig, RetryPolicy, SearchConfig};

use crate::cli::SearchArgs;

/// Search settings from the environment with the command's retry budget.
fn search_config(config: &AppConfig, args: &SearchArgs) -> SearchConfig {
    let base_delay = config.search.retry_policy().base_delay();
    config
        .search
        .clone()
        .with_retry_policy(RetryPolicy::new(u32::from(args.max_retries), base_delay))
}

/// Database path from the flag, falling back to the environment/default.
fn db_path<'a>(config: &'a AppConfig, flag: Option<&'a PathBuf>) -> &'a Path {
    flag.map_or(config.db_path.as_path(), PathBuf::as_path)
}
