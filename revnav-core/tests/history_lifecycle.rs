//! Integration test for the navigation history store.
//!
//! Exercises: open_db, migrate, detect_or_create_session, record_visit,
//! last_visit, recent_visits, update_session_timestamp.

use revnav_core::{
    codec, db, parse_change_view_url, ChangeViewState, ChildView, DiffView, NumericChangeId,
};

fn temp_db_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("history.db").to_string_lossy().to_string()
}

fn state_for(url: &str) -> ChangeViewState {
    parse_change_view_url(url, "").unwrap()
}

#[tokio::test]
async fn full_history_lifecycle() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| -> rusqlite::Result<i64> {
            db.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| -> rusqlite::Result<String> {
            db.query_row("PRAGMA journal_mode", [], |r| r.get(0))
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let session = db::detect_or_create_session(&conn, "https://review.example.com")
        .await
        .unwrap();
    assert!(!session.id.is_empty(), "session ID should be a non-empty UUID");
    assert_eq!(session.base_url, "https://review.example.com");

    let resumed = db::detect_or_create_session(&conn, "https://review.example.com")
        .await
        .unwrap();
    assert_eq!(resumed.id, session.id, "same server resumes the session");

    let other = db::detect_or_create_session(&conn, "https://other.example.com")
        .await
        .unwrap();
    assert_ne!(other.id, session.id, "different server = new session");

    assert!(db::last_visit(&conn, &session.id).await.unwrap().is_none());

    let first = state_for("/c/my/repo/+/42");
    let first_url = codec::create_change_view_url("", &first);
    let visit = db::record_visit(&conn, &session.id, &first_url, &first)
        .await
        .unwrap();
    assert!(visit.id > 0);
    assert_eq!(visit.change_num, 42);
    assert_eq!(visit.repo.as_deref(), Some("my/repo"));
    assert_eq!(visit.child_view, "OVERVIEW");

    let second = ChangeViewState::new(
        NumericChangeId::new(43).unwrap(),
        ChildView::Diff(DiffView::new("src/lib.rs")),
    );
    let second_url = codec::create_change_view_url("", &second);
    db::record_visit(&conn, &session.id, &second_url, &second)
        .await
        .unwrap();
    db::record_visit(&conn, &other.id, "/c/1", &state_for("/c/1"))
        .await
        .unwrap();

    let last = db::last_visit(&conn, &session.id).await.unwrap().unwrap();
    assert_eq!(last.url, "/c/43/src/lib.rs");
    assert_eq!(last.child_view, "DIFF");
    assert_eq!(state_for(&last.url), second);

    let recent = db::recent_visits(&conn, &session.id, 10).await.unwrap();
    let urls: Vec<_> = recent.iter().map(|v| v.url.as_str()).collect();
    assert_eq!(urls, vec!["/c/43/src/lib.rs", "/c/my/repo/+/42"], "newest first");
    assert_eq!(db::recent_visits(&conn, &session.id, 1).await.unwrap().len(), 1);

    db::update_session_timestamp(&conn, &session.id).await.unwrap();

    // A second connection sees the same history.
    let conn2 = db::open_db(&path).await.unwrap();
    let last2 = db::last_visit(&conn2, &session.id).await.unwrap().unwrap();
    assert_eq!(last2, last, "history should persist across connections");
}

#[tokio::test]
async fn visit_for_unknown_session_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let conn = db::open_db(&temp_db_path(&dir)).await.unwrap();

    let state = state_for("/c/5");
    let result = db::record_visit(&conn, "no-such-session", "/c/5", &state).await;
    assert!(result.is_err(), "foreign key should reject the visit");
}

#[tokio::test]
async fn reopening_does_not_rerun_migrations() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = temp_db_path(&dir);
    drop(db::open_db(&path).await.unwrap());
    let conn = db::open_db(&path).await.unwrap();

    let rows: i64 = conn
        .call(|db| -> rusqlite::Result<i64> {
            db.query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
        })
        .await
        .unwrap();
    assert_eq!(rows, 1);
}
