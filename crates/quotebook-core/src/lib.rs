//! Quotebook Core Library
//!
//! This crate provides the core functionality for Quotebook, a small
//! random-quote collection that can sync against a remote JSON collection
//! and reconcile category conflicts.
//!
//! # Quick Start
//!
//! ```text
//! let mut app = App::open(Config::load()?)?;
//!
//! app.add_quote("Simplicity is the soul of efficiency.", "Wisdom")?;
//! let quote = app.show_random()?;
//!
//! match app.sync().await? {
//!     SyncOutcome::ConflictsPending { .. } => app.resolve(Resolution::Merge)?,
//!     _ => 0,
//! };
//! ```
//!
//! # Modules
//!
//! - `app`: Application state owned by one controller (main entry point)
//! - `store`: Canonical quote list and random picking
//! - `models`: Quote, Conflict, and CategoryFilter
//! - `storage`: Key-value persistence
//! - `transfer`: JSON import and export
//! - `sync`: Remote gateway, conflict detection and resolution
//! - `config`: Application configuration

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use app::App;
pub use config::Config;
pub use error::{QuoteError, Result};
pub use models::{CategoryFilter, Conflict, Quote};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{pick_random, QuoteStore, StoreChange, StoreStats};
pub use sync::{Resolution, SyncEngine, SyncOutcome, SyncPhase};
