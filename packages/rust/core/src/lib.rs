//! Core pipeline orchestration for babelwiki.
//!
//! Ties relevance search, context assembly, and generation into the
//! lazy-materialization workflow ([`pipeline::get_or_create_article`]).

pub mod context;
pub mod pipeline;

pub use context::{NO_RELATED_CONTEXT, build_context};
pub use pipeline::get_or_create_article;
