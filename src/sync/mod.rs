//! Reconciliation of local skill folders with the registry.

pub mod engine;
pub mod reconcile;

pub use engine::{PublishedSkill, SyncEngine, SyncFailure, SyncOptions, SyncReport};
pub use reconcile::{Candidate, SyncStatus, classify, reconcile_all, reconcile_skill};
