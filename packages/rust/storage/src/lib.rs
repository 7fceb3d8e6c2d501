//! libSQL storage layer for babelwiki.
//!
//! The [`Storage`] struct wraps a libSQL database holding generated articles
//! plus an FTS5 index over keyword and content. Articles are inserted exactly
//! once per keyword; the primary-key constraint is the backstop against
//! concurrent double-generation, surfaced as
//! [`BabelWikiError::DuplicateKeyword`] so the pipeline can recover.

mod migrations;

use std::path::Path;

use babelwiki_shared::{Article, BabelWikiError, RelatedArticle, Result};
use chrono::Utc;
use libsql::{Connection, Database, params};

/// Default number of related articles returned by [`Storage::find_related`].
pub const DEFAULT_RELATED_LIMIT: u32 = 3;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BabelWikiError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        BabelWikiError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Insert a new article.
    ///
    /// A primary-key violation means another pipeline persisted the same
    /// keyword first and is returned as
    /// [`BabelWikiError::DuplicateKeyword`]; the caller should re-read and
    /// return the winning record.
    pub async fn insert_article(&self, article: &Article) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO articles (keyword, content, summary, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    article.keyword.as_str(),
                    article.content.as_str(),
                    article.summary.as_str(),
                    article.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| classify_insert_error(&article.keyword, e))?;
        Ok(())
    }

    /// Get an article by its normalized keyword.
    pub async fn get_article(&self, keyword: &str) -> Result<Option<Article>> {
        let mut rows = self
            .conn
            .query(
                "SELECT keyword, content, summary, created_at
                 FROM articles WHERE keyword = ?1",
                params![keyword],
            )
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_article(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(BabelWikiError::Storage(e.to_string())),
        }
    }

    /// List stored keywords in insertion order, up to `limit`.
    pub async fn list_keywords(&self, limit: u32) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT keyword FROM articles ORDER BY rowid LIMIT ?1",
                params![limit],
            )
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(
                row.get::<String>(0)
                    .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
            );
        }
        Ok(results)
    }

    /// Pick an approximately random stored keyword with one cheap query.
    ///
    /// Samples a random rowid below the current maximum and takes the first
    /// article at or above it. Articles are never deleted, so rowids are
    /// dense and the pick is close to uniform. Returns `None` on an empty
    /// store.
    pub async fn random_keyword(&self) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT keyword FROM articles
                 WHERE rowid >= (ABS(RANDOM()) % (SELECT MAX(rowid) FROM articles)) + 1
                 ORDER BY rowid LIMIT 1",
                params![],
            )
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        if let Ok(Some(row)) = rows.next().await {
            let keyword: String = row
                .get(0)
                .map_err(|e| BabelWikiError::Storage(e.to_string()))?;
            return Ok(Some(keyword));
        }

        // Sampling missed (or the table is empty) — fall back to the first row.
        let mut rows = self
            .conn
            .query(
                "SELECT keyword FROM articles ORDER BY rowid LIMIT 1",
                params![],
            )
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let keyword: String = row
                    .get(0)
                    .map_err(|e| BabelWikiError::Storage(e.to_string()))?;
                Ok(Some(keyword))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(BabelWikiError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Relevance search
    // -----------------------------------------------------------------------

    /// Find articles related to `keyword`, ranked by relevance descending.
    ///
    /// The keyword is split into whitespace terms combined disjunctively
    /// ("match any term"). The keyword column is weighted twice as heavily
    /// as the content column via BM25 column weights. Zero-term input and
    /// zero matches both return an empty list.
    pub async fn find_related(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<RelatedArticle>> {
        let Some(match_query) = build_match_query(keyword) else {
            return Ok(Vec::new());
        };

        // bm25() is smaller-is-better; negate so larger scores rank higher.
        let mut rows = self
            .conn
            .query(
                "SELECT a.keyword, a.content, a.summary,
                        -bm25(articles_fts, 2.0, 1.0) AS score
                 FROM articles_fts
                 JOIN articles a ON a.rowid = articles_fts.rowid
                 WHERE articles_fts MATCH ?1
                 ORDER BY score DESC
                 LIMIT ?2",
                params![match_query.as_str(), limit],
            )
            .await
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(RelatedArticle {
                keyword: row
                    .get::<String>(0)
                    .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
                content: row
                    .get::<String>(1)
                    .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
                summary: row
                    .get::<String>(2)
                    .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
                score: row.get::<f64>(3).unwrap_or(0.0),
            });
        }

        tracing::debug!(keyword, hits = results.len(), "relevance search complete");
        Ok(results)
    }
}

/// Build a disjunctive FTS5 MATCH expression from a keyword's terms.
///
/// Each term is quoted so FTS5 query syntax cannot leak in. Returns `None`
/// when the keyword contains no terms.
fn build_match_query(keyword: &str) -> Option<String> {
    let terms: Vec<String> = keyword
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "")))
        .filter(|t| t.len() > 2) // skip empty quoted pairs
        .collect();

    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" OR "))
}

/// Map a libSQL insert error, classifying uniqueness violations.
fn classify_insert_error(keyword: &str, e: libsql::Error) -> BabelWikiError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        BabelWikiError::DuplicateKeyword {
            keyword: keyword.to_string(),
        }
    } else {
        BabelWikiError::Storage(msg)
    }
}

/// Convert a database row to an [`Article`].
fn row_to_article(row: &libsql::Row) -> Result<Article> {
    Ok(Article {
        keyword: row
            .get::<String>(0)
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
        content: row
            .get::<String>(1)
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
        summary: row
            .get::<String>(2)
            .map_err(|e| BabelWikiError::Storage(e.to_string()))?,
        created_at: {
            let s: String = row
                .get(3)
                .map_err(|e| BabelWikiError::Storage(e.to_string()))?;
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| BabelWikiError::Storage(format!("invalid date: {e}")))?
        },
    })
}

/// Build a fresh [`Article`] with the current timestamp.
pub fn new_article(keyword: &str, content: String, summary: String) -> Article {
    Article {
        keyword: keyword.to_string(),
        content,
        summary,
        created_at: Utc::now(),
    }
}
