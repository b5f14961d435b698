//! Shared test utilities for the stylecheck workspace.
//!
//! In-memory doubles for every collaborator the reconciliation engine and
//! check orchestrator consume, plus fixture builders. Dev-dependency only.
//!
//! # Modules
//!
//! - [`store`]: [`MemoryStore`] recording every save
//! - [`fetch`]: [`ScriptedFetcher`] replaying per-URL responses
//! - [`log`]: [`MemoryLogStore`]
//! - [`fixtures`]: styles, remote documents and a wired-up [`Harness`]

pub mod fetch;
pub mod fixtures;
pub mod log;
pub mod store;

pub use fetch::{FetchCall, ScriptedFetcher};
pub use fixtures::Harness;
pub use log::MemoryLogStore;
pub use store::{MemoryStore, SaveCall, SaveOp};
