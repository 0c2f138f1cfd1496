#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Vidsync application wiring.
//!
//! Layout: `workflow.rs` (state owner and operation gate), `bootstrap.rs`
//! (filesystem bindings and telemetry from configuration), `error.rs`.

/// Configuration-driven wiring of bindings and telemetry.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Workflow controller and observable state.
pub mod workflow;

pub use bootstrap::{build_workflow, init_telemetry, logging_config};
pub use error::{AppError, AppResult, WorkflowError, WorkflowResult};
pub use workflow::{WorkflowController, WorkflowDeps, WorkflowState};
