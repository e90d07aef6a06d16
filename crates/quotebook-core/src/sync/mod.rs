//! Remote sync with conflict resolution
//!
//! ## Flow
//!
//! 1. `RemoteGateway::fetch` pulls the remote set (degrading to cached or
//!    built-in data when the endpoint is unreachable)
//! 2. `detect_conflicts` compares it with the local set by quote text
//! 3. No conflicts: `merge` runs and replaces the local set
//! 4. Conflicts: the round stays pending until the user picks a
//!    `Resolution`
//!
//! ## Usage
//!
//! ```ignore
//! let gateway = HttpGateway::from_config(&config)?;
//! let mut engine = SyncEngine::new(&mut store)?;
//!
//! if let SyncOutcome::ConflictsPending { .. } = engine.sync_cycle(&mut store, &gateway).await? {
//!     engine.resolve(&mut store, Resolution::KeepServer)?;
//! }
//! ```

pub mod detect;
pub mod engine;
pub mod gateway;
pub mod metadata;
pub mod resolve;

pub use detect::{detect_conflicts, merge};
pub use engine::{InFlight, SkipReason, SyncEngine, SyncGuard, SyncOutcome, SyncPhase};
pub use gateway::{FetchOutcome, HttpGateway, RemoteGateway};
pub use metadata::SyncMetadata;
pub use resolve::{apply_resolution, Resolution};
