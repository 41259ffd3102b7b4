use rusqlite::{Connection, Result};

/// Initialize the local photo library schema
pub fn init_library_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS library_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM library_schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_library_schema_v1(conn)?;
        conn.execute("INSERT INTO library_schema_version (version) VALUES (1)", [])?;
        log::info!("Photo library schema v1 applied");
    }

    Ok(())
}

/// Create photo library schema version 1
fn create_library_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS library_photos (
            uuid TEXT PRIMARY KEY,
            album TEXT,
            relative_path TEXT NOT NULL,
            is_favorite INTEGER NOT NULL DEFAULT 0 CHECK(is_favorite IN (0,1)),
            pixel_width INTEGER NOT NULL DEFAULT 0,
            pixel_height INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_library_photos_created_at ON library_photos(created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_library_photos_album ON library_photos(album)",
        [],
    )?;

    Ok(())
}
