//! dotsync core library.
//!
//! This crate provides the components for local-to-repository
//! synchronization of deployed configuration files: text/binary
//! classification, byte-exact comparison, ancestor resolution from version
//! control, three-way merging, timestamped backups, and the
//! reversible-operation journal that renders a standalone rollback script.

pub mod backup;
pub mod classify;
pub mod compare;
pub mod config;
pub mod discover;
pub mod errors;
pub mod journal;
pub mod merge;
pub mod session;
pub mod sync_pass;
pub mod tools;
pub mod vcs;

// Re-exports for convenience.
pub use config::Config;
pub use discover::SyncCandidate;
pub use errors::CoreError;
pub use session::{CancelFlag, SyncMode, SyncOptions, SyncSession};
pub use sync_pass::{run_pass, CandidateOutcome, SyncReport};
