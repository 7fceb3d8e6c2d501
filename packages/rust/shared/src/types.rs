//! Core domain types for the babelwiki encyclopedia.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BabelWikiError, Result};

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A persisted encyclopedia article.
///
/// The normalized keyword is the primary identity — there is no surrogate
/// key. `content` and `summary` are written exactly once by the pipeline
/// and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Normalized keyword (unique).
    pub keyword: String,
    /// Generated markdown body, including `[[wiki style links]]`.
    pub content: String,
    /// Generated short digest (~100 words), used for context assembly.
    pub summary: String,
    /// When the article was first materialized.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RelatedArticle
// ---------------------------------------------------------------------------

/// A relevance-search hit: an existing article plus its match score.
#[derive(Debug, Clone)]
pub struct RelatedArticle {
    /// The related article's keyword.
    pub keyword: String,
    /// Full markdown content of the related article.
    pub content: String,
    /// Stored digest of the related article.
    pub summary: String,
    /// Relevance score, larger is better.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Keyword normalization
// ---------------------------------------------------------------------------

/// Normalize a raw request keyword into its storage identity.
///
/// Underscores (the URL path convention for spaces) become spaces, anything
/// outside ASCII alphanumerics and whitespace is stripped, and the result
/// is trimmed. An empty result is a client input error.
///
/// `"Gr@nd Library#1"` normalizes to `"Grnd Library1"`.
pub fn normalize_keyword(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .replace('_', " ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Err(BabelWikiError::InvalidKeyword {
            input: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
