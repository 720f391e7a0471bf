use anyhow::{Context, Result};
use healthanalyzer::config::AppConfig;
use healthanalyzer::{CancelToken, Store};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Log to stderr so stdout carries only the report
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = config.storage.resolved_db_path();
    let store = Store::open_with_config(config.storage.clone())
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;

    let report = store
        .health(&CancelToken::with_timeout(Duration::from_secs(30)))
        .context("failed to run health check")?;
    store.close().context("failed to close store")?;

    println!("Health Analyzer Store Report");
    println!("============================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("Journal mode:      {}", report.journal_mode);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!();
    println!("Row counts:");
    println!("  Entries:         {}", report.entry_count);
    println!("  Findings:        {}", report.finding_count);
    println!("  Summaries:       {}", report.summary_count);
    println!("  Metrics:         {}", report.metric_count);
    println!("  Embeddings:      {}", report.embedding_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    Ok(())
}
