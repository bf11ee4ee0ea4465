//! v001: mutation queue and dead letters.
//!
//! AUTOINCREMENT keeps ids strictly increasing and never reused, even after
//! the queue is emptied.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS mutations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    url             TEXT NOT NULL,
    method          TEXT NOT NULL,
    headers         TEXT NOT NULL DEFAULT '{}',
    body            TEXT NOT NULL DEFAULT '',
    timestamp       TEXT NOT NULL,
    retry_count     INTEGER NOT NULL DEFAULT 0,
    next_attempt_at TEXT,
    last_error      TEXT
);

CREATE TABLE IF NOT EXISTS dead_letters (
    id               INTEGER PRIMARY KEY,
    url              TEXT NOT NULL,
    method           TEXT NOT NULL,
    headers          TEXT NOT NULL DEFAULT '{}',
    body             TEXT NOT NULL DEFAULT '',
    timestamp        TEXT NOT NULL,
    retry_count      INTEGER NOT NULL DEFAULT 0,
    last_error       TEXT,
    reason           TEXT NOT NULL,
    dead_lettered_at TEXT NOT NULL
);
";
