/// DDL to create the schema_version tracking table.
///
/// Applied on every open before the version is read. `IF NOT EXISTS` makes it
/// safe to run repeatedly.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 navigation history schema.
///
/// - `sessions`: one row per server base URL, keyed by UUID v4 text.
/// - `visits`: every change view state the navigator published, as its canonical URL.
///
/// Removing a session removes its visits.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id          TEXT    PRIMARY KEY,
        base_url    TEXT    NOT NULL,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS visits (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id  TEXT    NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        url         TEXT    NOT NULL,
        change_num  INTEGER NOT NULL CHECK(change_num > 0),
        repo        TEXT,
        child_view  TEXT    NOT NULL
                            CHECK(child_view IN ('OVERVIEW', 'DIFF', 'EDIT')),
        visited_at  INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS visits_by_session ON visits(session_id, id);
";

/// Runs forward-only schema migration up to the latest version.
///
/// Idempotent: called on every open.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        tracing::info!(from = version, to = 1, "migrating history schema");
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
