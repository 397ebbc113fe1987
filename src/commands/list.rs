//! List command handler: show stored books, newest first.

use anyhow::{Result, bail};
use bookmatch_core::{AppConfig, BookStore, Catalog, Database};

use crate::cli::ListArgs;

use super::db_path;

pub async fn run_list_command(args: &ListArgs, config: &AppConfig) -> Result<()> {
    let db = Database::new(db_path(config, args.db.as_ref())).await?;
    let catalog = Catalog::read_only(BookStore::new(db.clone()));

    let outcome = catalog.list_books(args.limit).await;
    db.close().await;

    let books = match outcome {
        Ok(books) => books,
        Err(error) => {
            let failure = error.to_failure_report();
            bail!("{}: {}", failure.error, failure.cause);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books stored yet.");
        return Ok(());
    }

    for book in &books {
        println!("{book}");
    }
    println!("Showing {} book(s).", books.len());

    Ok(())
}
