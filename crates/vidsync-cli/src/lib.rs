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

//! Terminal front-end for the vidsync workflow.
//!
//! Layout: `cli.rs` (argument parsing, exit codes, dispatch), `commands.rs`
//! (one handler per subcommand), `prompt.rs` (stdin-backed permission and
//! consent prompts), `output.rs` (rendering and notifications).

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod prompt;

pub use cli::run;
