use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("campus.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS credentials(
            email TEXT PRIMARY KEY,
            uid TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Single-row table mirroring the auth provider's on-device session
    // cache, so a relaunch still resolves a signed-in identity.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_session(
            slot INTEGER PRIMARY KEY CHECK(slot = 0),
            uid TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents(
            collection TEXT NOT NULL,
            key TEXT NOT NULL,
            fields_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY(collection, key)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        [],
    )?;

    Ok(conn)
}
