//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use quotebook_core::{Conflict, Quote, QuoteError, StoreStats};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the quote currently on display
    pub fn print_quote(&self, quote: &Quote) {
        match self.format {
            OutputFormat::Human => {
                println!();
                println!("  \"{}\"", quote.text);
                println!("      — {}", quote.category);
                println!();
            }
            OutputFormat::Json => print_json(quote),
            OutputFormat::Quiet => println!("{}", quote.text),
        }
    }

    /// Placeholder shown when the selected category has nothing to pick from
    pub fn print_empty_category(&self) {
        match self.format {
            OutputFormat::Human => {
                println!();
                println!("  No quotes available in this category. Add some quotes!");
                println!("      — Empty");
                println!();
            }
            OutputFormat::Json => print_json(&serde_json::Value::Null),
            OutputFormat::Quiet => {}
        }
    }

    /// Print quotes with their 1-based store positions
    pub fn print_quotes(&self, quotes: &[(usize, &Quote)]) {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("No quotes available. Add some quotes to get started!");
                    return;
                }
                for (index, quote) in quotes {
                    println!(
                        "{:>3}. \"{}\" - {}",
                        index + 1,
                        truncate(&quote.text, 70),
                        quote.category
                    );
                }
                println!("\n{} quote(s)", quotes.len());
            }
            OutputFormat::Json => {
                let entries: Vec<_> = quotes
                    .iter()
                    .map(|(index, quote)| {
                        serde_json::json!({
                            "position": index + 1,
                            "text": quote.text,
                            "category": quote.category,
                        })
                    })
                    .collect();
                print_json(&entries);
            }
            OutputFormat::Quiet => {
                for (_, quote) in quotes {
                    println!("{}", quote.text);
                }
            }
        }
    }

    /// Print categories, marking the active one
    pub fn print_categories(&self, categories: &[String], active: &str) {
        match self.format {
            OutputFormat::Human => {
                let marker = |name: &str| if name == active { "*" } else { " " };
                println!("{} all", marker("all"));
                for category in categories {
                    println!("{} {}", marker(category), category);
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "active": active,
                "categories": categories,
            })),
            OutputFormat::Quiet => {
                for category in categories {
                    println!("{}", category);
                }
            }
        }
    }

    pub fn print_stats(&self, stats: &StoreStats) {
        match self.format {
            OutputFormat::Human => {
                println!("Total Quotes: {}", stats.total_quotes);
                println!("Categories:   {}", stats.total_categories);
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "total_quotes": stats.total_quotes,
                "total_categories": stats.total_categories,
            })),
            OutputFormat::Quiet => println!("{}", stats.total_quotes),
        }
    }

    /// Print a pending conflict round
    pub fn print_conflicts(&self, conflicts: &[Conflict]) {
        match self.format {
            OutputFormat::Human => {
                if conflicts.is_empty() {
                    println!("No conflicts pending.");
                    return;
                }
                println!("── Conflicts ({}) ──", conflicts.len());
                for conflict in conflicts {
                    println!(
                        "\"{}\"\n    local: {}   server: {}",
                        truncate(&conflict.text, 60),
                        conflict.local_category,
                        conflict.server_category
                    );
                }
            }
            OutputFormat::Json => print_json(conflicts),
            OutputFormat::Quiet => {
                for conflict in conflicts {
                    println!("{}", conflict.text);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a transient warning to stderr (errors that don't end the session)
    ///
    /// Warnings are shown in every format, quiet included.
    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.warning_text(message));
    }

    fn warning_text(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::json!({"status": "warning", "message": message}).to_string()
            }
            OutputFormat::Human | OutputFormat::Quiet => format!("⚠ {}", message),
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Recovery suggestion for storage failures anywhere in the error chain
pub fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| match cause.downcast_ref::<QuoteError>() {
        Some(QuoteError::Storage(storage)) => storage.recovery_suggestion(),
        _ => None,
    })
}

/// Render an error chain on one line, followed by a recovery hint if any
pub fn describe_error(err: &anyhow::Error) -> String {
    let text = format!("{:#}", err);
    match recovery_hint(err) {
        Some(hint) if !text.contains(hint) => format!("{}\n  {}", text, hint),
        _ => text,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook_core::StorageError;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_warnings_shown_in_quiet_mode() {
        let quiet = Output::new(OutputFormat::Quiet);
        assert_eq!(quiet.warning_text("Sync failed"), "⚠ Sync failed");

        let json = Output::new(OutputFormat::Json);
        assert!(json.warning_text("Sync failed").contains("\"status\":\"warning\""));
    }

    #[test]
    fn test_describe_error_adds_storage_hint() {
        let err = anyhow::Error::new(QuoteError::from(StorageError::InvalidFormat {
            path: PathBuf::from("/data/store.json"),
            details: "expected value".to_string(),
        }))
        .context("Failed to open quote store");

        let text = describe_error(&err);
        assert!(text.starts_with("Failed to open quote store: "));
        assert!(text.contains("Move the damaged store file aside"));
    }

    #[test]
    fn test_describe_error_does_not_repeat_hint() {
        let err = anyhow::Error::new(QuoteError::from(StorageError::DiskFull {
            path: PathBuf::from("/data/store.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "No space left on device"),
        }));

        let text = describe_error(&err);
        assert_eq!(text.matches("Free up disk space").count(), 1);
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let err = anyhow::Error::new(QuoteError::NothingToResolve);
        assert!(recovery_hint(&err).is_none());
        assert_eq!(describe_error(&err), "There are no sync conflicts to resolve");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }
}
