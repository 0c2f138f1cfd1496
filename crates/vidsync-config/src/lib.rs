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

//! File- and environment-backed configuration for the vidsync workflow.
//!
//! Layout: `model.rs` (typed config), `loader.rs` (JSON file + `VIDSYNC_*`
//! overrides), `validate.rs` (validation helpers), `defaults.rs` (fallbacks).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_PREFIX, load, load_with};
pub use model::AppConfig;
