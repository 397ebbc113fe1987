//! Import command handler: search, dedupe and upsert into the catalog.

use anyhow::{Result, bail};
use bookmatch_core::{AppConfig, BookSearchClient, BookStore, Catalog, Database};

use crate::cli::ImportArgs;

use super::{db_path, search_config};

pub async fn run_import_command(args: &ImportArgs, config: &AppConfig) -> Result<()> {
    let request = args.search.to_request()?;
    // Credential problems surface before the database file is created.
    let client = BookSearchClient::new(&search_config(config, &args.search))?;

    let db = Database::new(db_path(config, args.db.as_ref())).await?;
    let catalog = Catalog::new(BookStore::new(db.clone()), client);

    let outcome = catalog.import_query(&request).await;
    db.close().await;

    let report = match outcome {
        Ok(report) => report,
        Err(error) => {
            let failure = error.to_failure_report();
            bail!("{}: {}", failure.error, failure.cause);
        }
    };

    println!(
        "Imported '{}': {} fetched, {} unique, {} new, {} updated, {} skipped.",
        report.query,
        report.fetched,
        report.unique,
        report.inserted,
        report.updated,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!(
            "  skipped: {} ({})",
            skipped.title.as_deref().unwrap_or("<untitled>"),
            skipped.reason.lines().next().unwrap_or_default()
        );
    }
    if report.truncated {
        println!("Stopped at the page limit; rerun with a higher --max-pages to collect more.");
    }

    Ok(())
}
