//! Knowledge-base statistics.
//!
//! Per-kind entry counts for one user, shown by `synapse stats` and served
//! at `GET /api/stats`. A quick way to confirm captures are landing.

use anyhow::Result;

use synapse_core::store::EntryStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let stats = store.count_by_kind(user_id).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Synapse — Knowledge Base Stats");
    println!("==============================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Size:      {}", format_bytes(db_size));
    println!("  User:      {}", user_id);
    println!();
    println!("  Entries:   {}", stats.total);
    println!("    quotes:  {}", stats.quotes);
    println!("    notes:   {}", stats.notes);
    println!("    links:   {}", stats.links);
    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
