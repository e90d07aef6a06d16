//! Sync command handlers

use anyhow::{Context, Result};

use quotebook_core::sync::SkipReason;
use quotebook_core::{App, Resolution, SyncOutcome};

use crate::output::Output;
use crate::prompt::choose_resolution;

/// Run one sync cycle, resolving any conflicts before returning
///
/// Without `--strategy`, a TTY is asked which strategy to use and a
/// non-interactive run keeps the local categories.
pub async fn sync(app: &mut App, strategy: Option<Resolution>, output: &Output) -> Result<()> {
    output.message(&format!("Syncing with {}...", app.config().remote_url));

    let outcome = app.sync().await.context("Sync failed")?;
    report(&outcome, output);

    if let SyncOutcome::ConflictsPending { .. } = outcome {
        let resolution = match strategy {
            Some(resolution) => Some(resolution),
            None if output.should_prompt() => choose_resolution()?,
            None => None,
        };
        let resolution = resolution.unwrap_or_else(|| {
            output.message("No strategy chosen - keeping local categories.");
            Resolution::KeepLocal
        });
        resolve(app, resolution, output)?;
    }

    Ok(())
}

/// Describe a finished cycle
pub fn report(outcome: &SyncOutcome, output: &Output) {
    if outcome.is_degraded() {
        output.warn("Remote unavailable - using cached or offline quotes");
    }

    match outcome {
        SyncOutcome::Merged {
            total, local_only, ..
        } => {
            output.success(&format!(
                "Sync complete - {} quotes ({} only on this device)",
                total, local_only
            ));
        }
        SyncOutcome::ConflictsPending { conflicts, .. } => {
            output.print_conflicts(conflicts);
        }
        SyncOutcome::Skipped(SkipReason::InFlight) => {
            output.message("A sync is already running.");
        }
        SyncOutcome::Skipped(SkipReason::ConflictsPending) => {
            output.message("Resolve pending conflicts first: resolve keep-local|keep-server|merge");
        }
    }
}

/// Apply a strategy to the pending conflict round
pub fn resolve(app: &mut App, resolution: Resolution, output: &Output) -> Result<()> {
    let changed = app.resolve(resolution)?;
    output.success(&format!("Applied {} ({} quote(s) changed)", resolution, changed));
    Ok(())
}

/// Post the first quotes to the remote collection
pub async fn push(app: &App, output: &Output) -> Result<()> {
    let posted = app.push().await.context("Push failed")?;
    output.success(&format!("Posted {} quotes to the server", posted));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use crate::shell::tests::ScriptedGateway;
    use quotebook_core::{Config, MemoryStore, Quote};

    fn app_with_remote(remote: Vec<Quote>) -> App {
        App::with_parts(
            Config::default(),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            Box::new(ScriptedGateway::new(remote)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sync_with_strategy_resolves_immediately() {
        let text = "In the middle of difficulty lies opportunity.";
        let mut app = app_with_remote(vec![Quote::new(text, "API")]);

        let output = Output::new(OutputFormat::Quiet);
        sync(&mut app, Some(Resolution::KeepServer), &output)
            .await
            .unwrap();

        assert!(app.pending_conflicts().is_empty());
        assert!(app
            .store()
            .quotes()
            .iter()
            .any(|q| q.text == text && q.category == "API"));
        assert!(app.sync_metadata().last_sync_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_non_interactive_sync_keeps_local() {
        let text = "In the middle of difficulty lies opportunity.";
        let mut app = app_with_remote(vec![Quote::new(text, "API")]);
        let before = app.store().quotes().to_vec();

        sync(&mut app, None, &Output::new(OutputFormat::Json))
            .await
            .unwrap();

        assert!(app.pending_conflicts().is_empty());
        assert_eq!(app.store().quotes(), before.as_slice());
    }

    #[tokio::test]
    async fn test_clean_sync_merges() {
        let mut app = app_with_remote(vec![Quote::new("Remote only", "Life")]);
        sync(&mut app, None, &Output::new(OutputFormat::Quiet))
            .await
            .unwrap();
        assert_eq!(app.store().len(), 9);
        assert_eq!(app.store().quotes()[0], Quote::new("Remote only", "Life"));
    }
}
