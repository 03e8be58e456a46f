//! Utility to inspect the client document and report suspicious records.
//!
//! Usage: `inspect_store [path]` (defaults to `DB_PATH`, then `db.json`).

use case_intake_api::db::{DocumentBackend, JsonFileBackend, StoreDocument};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;

/// Main entry point for the inspection utility.
///
/// Loads the document read-only and prints the record count, duplicate
/// identifiers, records without a first name and the latest edit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var("DB_PATH").ok())
        .unwrap_or_else(|| "db.json".to_string());

    let backend = JsonFileBackend::new(&path);
    let document = backend.load().await?;
    tracing::info!("Loaded {}", backend.describe());

    for line in report(&document) {
        println!("{}", line);
    }

    Ok(())
}

fn report(document: &StoreDocument) -> Vec<String> {
    let records = &document.submissions;
    let mut lines = vec![format!("Records: {}", records.len())];

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for record in records {
        if let Some(id) = record.id() {
            *seen.entry(id).or_default() += 1;
        }
    }
    let mut duplicates: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    if duplicates.is_empty() {
        lines.push("Duplicate ids: none".to_string());
    } else {
        lines.push("Duplicate ids:".to_string());
        for (id, n) in duplicates {
            lines.push(format!("  - {} ({} records)", id, n));
        }
    }

    let missing_ids = records.iter().filter(|r| r.id().is_none()).count();
    if missing_ids > 0 {
        lines.push(format!("Records without id: {}", missing_ids));
    }

    let unnamed: Vec<&str> = records
        .iter()
        .filter(|r| r.first_name().map_or(true, |n| n.trim().is_empty()))
        .map(|r| r.id().unwrap_or("?"))
        .collect();
    if unnamed.is_empty() {
        lines.push("Records without first name: none".to_string());
    } else {
        lines.push(format!("Records without first name: {}", unnamed.join(", ")));
    }

    match records
        .iter()
        .filter_map(|r| r.last_update().map(|ts| (ts, r)))
        .max_by_key(|(ts, _)| *ts)
    {
        Some((ts, record)) => lines.push(format!(
            "Last update: {} ({})",
            ts.to_rfc3339(),
            record.id().unwrap_or("?")
        )),
        None => lines.push("Last update: never".to_string()),
    }

    if !document.other.is_empty() {
        let keys: Vec<&str> = document.other.keys().map(String::as_str).collect();
        lines.push(format!("Other top-level keys: {}", keys.join(", ")));
    }

    lines
}
