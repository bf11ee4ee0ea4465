//! v002: namespaced response cache.

pub const MIGRATION_SQL: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    namespace  TEXT NOT NULL,
    cache_key  TEXT NOT NULL,
    status     INTEGER NOT NULL,
    headers    TEXT NOT NULL DEFAULT '{}',
    body       BLOB NOT NULL,
    stored_at  TEXT NOT NULL,
    PRIMARY KEY (namespace, cache_key)
);

CREATE INDEX IF NOT EXISTS idx_cache_namespace ON cache_entries(namespace);
";
