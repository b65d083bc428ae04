use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::types::ChangeViewState;

/// A navigation session for one server, keyed by UUID v4 text.
///
/// Every launch against the same `base_url` resumes the most recent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub base_url: String,
    pub created_at: i64, // Unix timestamp seconds
    pub updated_at: i64, // Unix timestamp seconds
}

/// One published change view state, stored as its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub id: i64,
    pub session_id: String,
    pub url: String,
    pub change_num: u32,
    pub repo: Option<String>,
    /// `OVERVIEW`, `DIFF` or `EDIT`.
    pub child_view: String,
    pub visited_at: i64,
}

impl Visit {
    fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            session_id: r.get(1)?,
            url: r.get(2)?,
            change_num: r.get(3)?,
            repo: r.get(4)?,
            child_view: r.get(5)?,
            visited_at: r.get(6)?,
        })
    }
}

const VISIT_COLUMNS: &str = "id, session_id, url, change_num, repo, child_view, visited_at";

/// Opens (or creates) the history database at `path`, configures WAL mode,
/// and applies schema migrations.
///
/// `busy_timeout` is set through the `Connection` method rather than a PRAGMA
/// string so it takes effect regardless of pragma caching.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| -> rusqlite::Result<()> {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        crate::schema::migrate(db)
    })
    .await?;

    tracing::debug!(path, "history database ready");
    Ok(conn)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Finds the most recent session for `base_url`, or creates one.
///
/// A resumed session gets its `updated_at` bumped. Both paths write inside
/// `BEGIN IMMEDIATE`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query or write transaction fails.
pub async fn detect_or_create_session(
    conn: &Connection,
    base_url: &str,
) -> Result<Session, tokio_rusqlite::Error> {
    let base_url = base_url.to_owned();

    conn.call(move |db| -> rusqlite::Result<Session> {
        let existing: Option<Session> = db
            .query_row(
                "SELECT id, base_url, created_at, updated_at
                 FROM sessions
                 WHERE base_url = ?1
                 ORDER BY updated_at DESC
                 LIMIT 1",
                rusqlite::params![&base_url],
                |r| {
                    Ok(Session {
                        id: r.get(0)?,
                        base_url: r.get(1)?,
                        created_at: r.get(2)?,
                        updated_at: r.get(3)?,
                    })
                },
            )
            .optional()?;

        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let session = match existing {
            Some(mut session) => {
                tx.execute(
                    "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, &session.id],
                )?;
                session.updated_at = now;
                session
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO sessions (id, base_url, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    rusqlite::params![&id, &base_url, now],
                )?;
                Session {
                    id,
                    base_url,
                    created_at: now,
                    updated_at: now,
                }
            }
        };
        tx.commit()?;
        Ok(session)
    })
    .await
}

/// Appends a visit of `state`, encoded as `url`, to `session_id`.
///
/// Returns the stored row.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the insert fails, e.g. for an unknown session.
pub async fn record_visit(
    conn: &Connection,
    session_id: &str,
    url: &str,
    state: &ChangeViewState,
) -> Result<Visit, tokio_rusqlite::Error> {
    let mut visit = Visit {
        id: 0,
        session_id: session_id.to_owned(),
        url: url.to_owned(),
        change_num: state.change_num.get(),
        repo: state.repo.clone(),
        child_view: state.child_view_kind().as_str().to_owned(),
        visited_at: now_secs(),
    };

    conn.call(move |db| -> rusqlite::Result<Visit> {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO visits (session_id, url, change_num, repo, child_view, visited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &visit.session_id,
                &visit.url,
                visit.change_num,
                &visit.repo,
                &visit.child_view,
                visit.visited_at
            ],
        )?;
        visit.id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(visit)
    })
    .await
}

/// Returns the latest visit of `session_id`, if any.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn last_visit(
    conn: &Connection,
    session_id: &str,
) -> Result<Option<Visit>, tokio_rusqlite::Error> {
    Ok(recent_visits(conn, session_id, 1).await?.into_iter().next())
}

/// Returns up to `limit` visits of `session_id`, newest first.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn recent_visits(
    conn: &Connection,
    session_id: &str,
    limit: usize,
) -> Result<Vec<Visit>, tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    conn.call(move |db| -> rusqlite::Result<Vec<Visit>> {
        let mut stmt = db.prepare(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits
             WHERE session_id = ?1
             ORDER BY id DESC
             LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![&session_id, limit], Visit::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// Updates the `updated_at` timestamp for `session_id` to the current time.
///
/// Called on quit so `detect_or_create_session` resumes this session next time.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn update_session_timestamp(
    conn: &Connection,
    session_id: &str,
) -> Result<(), tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| -> rusqlite::Result<()> {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, &session_id],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}
