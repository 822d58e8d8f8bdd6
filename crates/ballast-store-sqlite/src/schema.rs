//! SQL schema for the ballast SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS entities (
    kind       TEXT    NOT NULL,   -- 'user' | 'topic' | 'post'
    id         INTEGER NOT NULL,   -- per-kind sequence, assigned at save
    fields     TEXT    NOT NULL,   -- JSON object of all field values
    created_at TEXT    NOT NULL,   -- ISO 8601 UTC; store-assigned
    PRIMARY KEY (kind, id)
);

-- One row per claimed unique value. The primary key is the claim itself:
-- a second save of the same (kind, field, value) cannot commit.
CREATE TABLE IF NOT EXISTS unique_claims (
    kind  TEXT    NOT NULL,
    field TEXT    NOT NULL,
    value TEXT    NOT NULL,         -- JSON-encoded field value
    id    INTEGER NOT NULL,         -- owning entity
    PRIMARY KEY (kind, field, value)
);

-- Named references between entities, written in the same transaction as
-- their source entity and never touched again.
CREATE TABLE IF NOT EXISTS relations (
    source_kind TEXT    NOT NULL,
    source_id   INTEGER NOT NULL,
    name        TEXT    NOT NULL,   -- 'author' | 'topic' | 'parent'
    target_kind TEXT    NOT NULL,
    target_id   INTEGER NOT NULL,
    PRIMARY KEY (source_kind, source_id, name)
);

-- Identity sequences, one per kind, bumped inside the save transaction.
CREATE TABLE IF NOT EXISTS counters (
    kind TEXT PRIMARY KEY,
    next INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS relations_target_idx
    ON relations(target_kind, target_id);

PRAGMA user_version = 1;
";
