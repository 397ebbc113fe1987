//! Fetch command handler: search, dedupe and export to files.

use anyhow::Result;
use bookmatch_core::export::export_batch;
use bookmatch_core::{AppConfig, BookSearchClient, reconcile};
use tracing::info;

use crate::cli::FetchArgs;

use super::search_config;

pub async fn run_fetch_command(args: &FetchArgs, config: &AppConfig) -> Result<()> {
    let request = args.search.to_request()?;
    let client = BookSearchClient::new(&search_config(config, &args.search))?;

    info!(
        query = request.query(),
        target = %request.target(),
        sort = %request.sort(),
        size = request.page_size(),
        max_pages = request.max_pages(),
        "starting search"
    );

    let results = client.fetch_all(&request).await?;
    let fetched = results.records().len();
    let pages = results.pages_fetched();
    let truncated = results.truncated();

    let unique = reconcile(results.into_records());
    let paths = export_batch(&args.out_dir, request.query(), &unique)?;

    println!("Fetched {fetched} records from {pages} page(s); {} after removing duplicates.", unique.len());
    if truncated {
        println!(
            "Stopped at the page limit ({}); rerun with a higher --max-pages to collect more.",
            request.max_pages()
        );
    }
    println!("JSON: {}", paths.json.display());
    println!("CSV:  {}", paths.csv.display());

    Ok(())
}
