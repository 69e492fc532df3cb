//! Shared types, error model, and configuration for msgview.
//!
//! This crate is the foundation depended on by the other msgview crates.
//! It provides:
//! - [`MsgviewError`] — the unified error type
//! - Domain types ([`ConversationFile`], [`MessageDataset`])
//! - Configuration ([`AppConfig`], [`BundleConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BundleConfig, BundleRulesConfig, PathsConfig, config_dir, config_file_path,
    init_config, init_config_at, load_config, load_config_from, resolve_path,
};
pub use error::{MsgviewError, Result};
pub use types::{
    ConversationFile, DATA_ASSIGNMENT, DATA_MARKER, DEFAULT_PATTERN, MessageDataset,
    SENTINEL_FILE_NAME,
};
