// Database schema: table creation.
//
// A `schema_version` table records applied versions so later migrations have
// somewhere to hook in. List-valued note fields are stored as JSON text.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// Create all tables if they don't exist yet.
///
/// This is idempotent and safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Published notes, one row per successful Micropub create
        CREATE TABLE IF NOT EXISTS notes (
            slug TEXT PRIMARY KEY,
            url TEXT NOT NULL UNIQUE,
            name TEXT,
            content TEXT,
            summary TEXT,
            published TEXT NOT NULL,           -- RFC 3339, UTC, millisecond precision
            category TEXT NOT NULL DEFAULT '[]',
            in_reply_to TEXT NOT NULL DEFAULT '[]',
            like_of TEXT NOT NULL DEFAULT '[]',
            repost_of TEXT NOT NULL DEFAULT '[]',
            bookmark_of TEXT NOT NULL DEFAULT '[]',
            photo TEXT NOT NULL DEFAULT '[]',
            video TEXT NOT NULL DEFAULT '[]',
            syndication TEXT NOT NULL DEFAULT '[]',
            rsvp TEXT,
            post_types TEXT NOT NULL DEFAULT '[]',
            mention_targets TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Cited posts (h-cite references)
        CREATE TABLE IF NOT EXISTS contexts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            name TEXT,
            content TEXT,
            author_name TEXT,
            author_url TEXT,
            published TEXT,
            post_types TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- People (h-card references); uid is the card's uid or first URL
        CREATE TABLE IF NOT EXISTS people (
            uid TEXT PRIMARY KEY,
            name TEXT,
            url TEXT NOT NULL DEFAULT '[]',
            photo TEXT,
            post_types TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notes_published
            ON notes(published);

        CREATE INDEX IF NOT EXISTS idx_contexts_url
            ON contexts(url);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )
    .context("Failed to record schema version")?;

    Ok(())
}

/// Count the number of user-created tables in the database.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
