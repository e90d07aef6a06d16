//! Interactive shell
//!
//! Reads commands line by line while a recurring timer drives auto-sync.
//! Both are polled from one task, so a timer cycle never overlaps a
//! command; the in-flight guard in the sync engine still rejects overlap.
//!
//! The displayed quote follows the store's change feed: a delete or a
//! replaced set (sync, resolution) shows a fresh pick. The session is
//! cleared however the shell ends: `quit`, end of input, Ctrl-C or error.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use quotebook_core::{App, CategoryFilter, QuoteError, Resolution, StoreChange, SyncOutcome};

use crate::commands;
use crate::commands::quote::to_index;
use crate::output::{describe_error, Output};
use crate::prompt::parse_yes;

const HELP: &str = "\
Commands:
  <enter>, show, next         Show another random quote
  filter [<category>|all]     Show or change the category filter
  categories                  List categories
  list                        List quotes in the current filter
  add <text> | <category>     Add a quote
  delete <position>           Delete the quote at a list position
  stats                       Show collection statistics
  export [<file>]             Export all quotes as JSON
  import <file>               Append quotes from a JSON file
  sync                        Sync with the server now
  conflicts                   Show pending conflicts
  resolve keep-local|keep-server|merge
                              Resolve pending conflicts
  push                        Post the first quotes to the server
  autosync [on|off]           Toggle the recurring sync timer
  status                      Show sync status
  help                        Show this help
  quit                        Leave the shell";

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Show,
    Filter(Option<CategoryFilter>),
    Categories,
    List,
    Add { text: String, category: String },
    Delete(usize),
    Stats,
    Export(Option<PathBuf>),
    Import(PathBuf),
    Sync,
    Conflicts,
    Resolve(Resolution),
    Push,
    AutoSync(Option<bool>),
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" | "show" | "next" | "n" => ShellCommand::Show,
            "filter" | "f" => ShellCommand::Filter(if rest.is_empty() {
                None
            } else {
                Some(crate::filter_from(rest.to_string()))
            }),
            "categories" | "cats" => ShellCommand::Categories,
            "list" | "ls" => ShellCommand::List,
            "add" => {
                let (text, category) = rest
                    .rsplit_once('|')
                    .ok_or("usage: add <text> | <category>")?;
                ShellCommand::Add {
                    text: text.trim().to_string(),
                    category: category.trim().to_string(),
                }
            }
            "delete" | "rm" => ShellCommand::Delete(
                rest.parse()
                    .map_err(|_| "usage: delete <position>".to_string())?,
            ),
            "stats" => ShellCommand::Stats,
            "export" => ShellCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "import" => {
                if rest.is_empty() {
                    return Err("usage: import <file>".to_string());
                }
                ShellCommand::Import(PathBuf::from(rest))
            }
            "sync" | "s" => ShellCommand::Sync,
            "conflicts" => ShellCommand::Conflicts,
            "resolve" => ShellCommand::Resolve(rest.parse()?),
            "push" => ShellCommand::Push,
            "autosync" => ShellCommand::AutoSync(match rest {
                "" => None,
                "on" => Some(true),
                "off" => Some(false),
                _ => return Err("usage: autosync [on|off]".to_string()),
            }),
            "status" => ShellCommand::Status,
            "help" | "h" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => {
                return Err(format!(
                    "Unknown command '{}'. Type 'help' for a list.",
                    other
                ))
            }
        };
        Ok(command)
    }
}

/// Run the shell on stdin
pub async fn run(app: &mut App, output: &Output) -> Result<()> {
    Shell::new(app, output, BufReader::new(tokio::io::stdin()))
        .run()
        .await
}

pub struct Shell<'a, R> {
    app: &'a mut App,
    output: &'a Output,
    lines: Lines<R>,
    auto_sync: bool,
    ticker: Interval,
    changes: watch::Receiver<StoreChange>,
}

impl<'a, R: AsyncBufRead + Unpin> Shell<'a, R> {
    pub fn new(app: &'a mut App, output: &'a Output, reader: R) -> Self {
        let period = app.config().sync_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let auto_sync = app.config().auto_sync;
        let changes = app.store().subscribe();

        Self {
            app,
            output,
            lines: reader.lines(),
            auto_sync,
            ticker,
            changes,
        }
    }

    /// Read commands until the shell ends, then end the session
    pub async fn run(mut self) -> Result<()> {
        let result = self.read_commands().await;
        let cleared = self.app.end_session();
        result?;
        cleared?;
        Ok(())
    }

    async fn read_commands(&mut self) -> Result<()> {
        self.greet();
        if self.app.config().sync_on_start {
            self.sync().await;
            self.refresh_view();
        }

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut watch_interrupt = true;

        loop {
            self.prompt();
            tokio::select! {
                signal = &mut interrupt, if watch_interrupt => match signal {
                    Ok(()) => {
                        debug!("Interrupted");
                        println!();
                        break;
                    }
                    Err(e) => {
                        warn!("Cannot listen for Ctrl-C: {}", e);
                        watch_interrupt = false;
                    }
                },
                line = self.lines.next_line() => {
                    let Some(line) = line? else { break };
                    match ShellCommand::parse(&line) {
                        Ok(ShellCommand::Quit) => break,
                        Ok(command) => {
                            if let Err(e) = self.execute(command).await {
                                self.output.warn(&describe_error(&e));
                            }
                        }
                        Err(usage) => self.output.warn(&usage),
                    }
                    self.refresh_view();
                }
                _ = self.ticker.tick(), if self.auto_sync => {
                    debug!("Auto-sync timer fired");
                    self.sync().await;
                    self.refresh_view();
                }
            }
        }

        Ok(())
    }

    /// Show a fresh quote when the store dropped or replaced what was displayed
    fn refresh_view(&mut self) {
        if !self.changes.has_changed().unwrap_or(false) {
            return;
        }
        let change = self.changes.borrow_and_update().clone();
        if matches!(change, StoreChange::Deleted { .. } | StoreChange::Replaced) {
            debug!(?change, "Refreshing displayed quote");
            if let Err(e) = commands::quote::show(self.app, None, self.output) {
                self.output.warn(&describe_error(&e));
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<()> {
        let app = &mut *self.app;
        let output = self.output;

        match command {
            ShellCommand::Show => commands::quote::show(app, None, output)?,
            ShellCommand::Filter(None) => commands::quote::filter(app, None, output)?,
            ShellCommand::Filter(Some(filter)) => {
                commands::quote::filter(app, Some(filter), output)?;
                commands::quote::show(app, None, output)?;
            }
            ShellCommand::Categories => commands::quote::categories(app, output)?,
            ShellCommand::List => commands::quote::list(app, None, output)?,
            ShellCommand::Add { text, category } => {
                commands::quote::add(app, &text, &category, output)?
            }
            ShellCommand::Delete(position) => self.delete(position).await?,
            ShellCommand::Stats => commands::quote::stats(app, output)?,
            ShellCommand::Export(path) => commands::transfer::export(app, path.as_deref(), output)?,
            ShellCommand::Import(path) => commands::transfer::import(app, &path, output)?,
            ShellCommand::Sync => self.sync().await,
            ShellCommand::Conflicts => output.print_conflicts(app.pending_conflicts()),
            ShellCommand::Resolve(resolution) => {
                commands::sync::resolve(app, resolution, output)?
            }
            ShellCommand::Push => commands::sync::push(app, output).await?,
            ShellCommand::AutoSync(setting) => self.set_auto_sync(setting),
            ShellCommand::Status => commands::status::show(app, output)?,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    /// Confirm on the shell's own input, then delete
    async fn delete(&mut self, position: usize) -> Result<()> {
        let index = to_index(position)?;
        let Some(quote) = self.app.store().quotes().get(index).cloned() else {
            return Err(QuoteError::Index {
                index,
                len: self.app.store().len(),
            }
            .into());
        };

        if self.output.should_prompt() {
            println!("Delete quote: \"{}\" - {}", quote.text, quote.category);
            print!("Are you sure? [y/N] ");
            std::io::stdout().flush()?;
            let answer = self.lines.next_line().await?.unwrap_or_default();
            if !parse_yes(&answer) {
                println!("Cancelled.");
                return Ok(());
            }
        }

        commands::quote::remove(self.app, position, self.output)
    }

    async fn sync(&mut self) {
        match self.app.sync().await {
            Ok(outcome) => {
                commands::sync::report(&outcome, self.output);
                if let SyncOutcome::ConflictsPending { .. } = outcome {
                    self.output
                        .message("Choose: resolve keep-local | keep-server | merge");
                }
            }
            Err(e) => {
                warn!("Sync failed: {}", e);
                self.output.warn(&format!("Sync failed: {}", e));
            }
        }
    }

    fn set_auto_sync(&mut self, setting: Option<bool>) {
        if let Some(enabled) = setting {
            if enabled && !self.auto_sync {
                self.ticker.reset();
            }
            self.auto_sync = enabled;
        }
        self.output.message(&format!(
            "Auto-sync {}",
            if self.auto_sync {
                format!("on (every {}s)", self.app.config().sync_interval_secs)
            } else {
                "off".to_string()
            }
        ));
    }

    fn greet(&mut self) {
        if !self.output.should_prompt() {
            return;
        }
        println!("Quotebook - type 'help' for commands");

        match self.app.last_viewed() {
            Some(quote) => self.output.print_quote(&quote),
            None => {
                if let Err(e) = commands::quote::show(self.app, None, self.output) {
                    self.output.warn(&describe_error(&e));
                }
            }
        }
    }

    fn prompt(&self) {
        if self.output.should_prompt() {
            print!("quotebook> ");
            let _ = std::io::stdout().flush();
        }
    }
}
