//! Shared types, error model, and configuration for babelwiki.
//!
//! This crate is the foundation depended on by all other babelwiki crates.
//! It provides:
//! - [`BabelWikiError`] — the unified error type
//! - Domain types ([`Article`], [`RelatedArticle`], keyword normalization)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OpenAiConfig, ServerConfig, StorageConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{BabelWikiError, Result};
pub use types::{Article, RelatedArticle, normalize_keyword};
