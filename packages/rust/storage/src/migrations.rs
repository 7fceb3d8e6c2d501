//! SQL migration definitions for the babelwiki database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: articles, FTS5 search index",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Generated encyclopedia articles, keyed by normalized keyword
CREATE TABLE IF NOT EXISTS articles (
    keyword    TEXT PRIMARY KEY,
    content    TEXT NOT NULL,
    summary    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Full-text search over keyword + content
CREATE VIRTUAL TABLE IF NOT EXISTS articles_fts USING fts5(
    keyword,
    content,
    content=articles,
    content_rowid=rowid
);

-- Triggers to keep FTS in sync with the articles table
CREATE TRIGGER IF NOT EXISTS articles_fts_insert AFTER INSERT ON articles BEGIN
    INSERT INTO articles_fts(rowid, keyword, content)
    VALUES (new.rowid, new.keyword, new.content);
END;

CREATE TRIGGER IF NOT EXISTS articles_fts_delete AFTER DELETE ON articles BEGIN
    INSERT INTO articles_fts(articles_fts, rowid, keyword, content)
    VALUES ('delete', old.rowid, old.keyword, old.content);
END;

CREATE TRIGGER IF NOT EXISTS articles_fts_update AFTER UPDATE ON articles BEGIN
    INSERT INTO articles_fts(articles_fts, rowid, keyword, content)
    VALUES ('delete', old.rowid, old.keyword, old.content);
    INSERT INTO articles_fts(rowid, keyword, content)
    VALUES (new.rowid, new.keyword, new.content);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
