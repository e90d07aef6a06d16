//! Status command handler

use anyhow::Result;

use quotebook_core::App;

use crate::output::{Output, OutputFormat};

/// Show sync status and collection counts
pub fn show(app: &App, output: &Output) -> Result<()> {
    let config = app.config();
    let metadata = app.sync_metadata();
    let stats = app.stats();
    let pending = app.pending_conflicts().len();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "device_id": metadata.device_id,
                    "last_sync": metadata.last_sync_timestamp,
                    "remote_url": config.remote_url,
                    "auto_sync": config.auto_sync,
                    "sync_interval_secs": config.sync_interval_secs,
                    "pending_conflicts": pending,
                    "filter": app.filter().to_string(),
                    "counts": {
                        "quotes": stats.total_quotes,
                        "categories": stats.total_categories
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", metadata.device_id);
        }
        OutputFormat::Human => {
            println!("Quotebook Status");
            println!("================");
            println!();
            println!("Device: {}", metadata.device_id);
            println!();
            println!("Sync:");
            println!("  Server:    {}", config.remote_url);
            println!(
                "  Last sync: {}",
                metadata
                    .last_sync()
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "never".to_string())
            );
            println!(
                "  Auto-sync: {}",
                if config.auto_sync {
                    format!("every {}s", config.sync_interval_secs)
                } else {
                    "disabled".to_string()
                }
            );
            if pending > 0 {
                println!("  Pending:   {} conflict(s)", pending);
            }
            println!();
            println!("Collection:");
            println!("  Quotes:     {}", stats.total_quotes);
            println!("  Categories: {}", stats.total_categories);
            println!("  Filter:     {}", app.filter());
        }
    }

    Ok(())
}
