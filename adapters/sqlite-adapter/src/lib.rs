//! sqlite-adapter — SQLite implementation of the CatalogRepository port.
//!
//! Purpose
//! - Provide a lightweight, file-based repository for the brand and type tables.
//! - Implements the `CatalogRepository` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Stores timestamps as seconds since UNIX_EPOCH.
//! - `name` carries a UNIQUE constraint; violations map to `CoreError::AlreadyExists`.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use domain::{CatalogEntity, CatalogKind, CatalogRepository, CoreError, EntityName};
use rusqlite::{params, Connection};

/// SQLite-backed catalog repository.
pub struct SqliteRepo {
    conn: std::sync::Mutex<Connection>,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self { conn: std::sync::Mutex::new(conn) })
    }

    /// Like `new`, but creates the parent directory first.
    pub fn open_creating_dirs<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| CoreError::Repository(format!("create db dir: {e}")))?;
        }
        Self::new(path)
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    for kind in CatalogKind::ALL {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
            table = kind.table()
        ))
        .map_err(map_sqerr)?;
    }
    Ok(())
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError { CoreError::Repository(format!("sqlite error: {e}")) }

fn system_time_to_secs(t: SystemTime) -> u64 { t.duration_since(UNIX_EPOCH).unwrap_or(Duration::from_secs(0)).as_secs() }
fn secs_to_system_time(secs: u64) -> SystemTime { UNIX_EPOCH + Duration::from_secs(secs) }

fn row_to_entity(row: &rusqlite::Row) -> Result<CatalogEntity, CoreError> {
    let id: i64 = row.get(0).map_err(map_sqerr)?;
    let name: String = row.get(1).map_err(map_sqerr)?;
    let created_at: i64 = row.get(2).map_err(map_sqerr)?;
    let updated_at: i64 = row.get(3).map_err(map_sqerr)?;

    let name = EntityName::new(name).map_err(|e| CoreError::Repository(format!("bad name in db: {e}")))?;
    Ok(CatalogEntity {
        id: id as u64,
        name,
        created_at: secs_to_system_time(created_at as u64),
        updated_at: secs_to_system_time(updated_at as u64),
    })
}

impl CatalogRepository for SqliteRepo {
    fn create(&self, kind: CatalogKind, name: &EntityName, at: SystemTime) -> Result<CatalogEntity, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let secs = system_time_to_secs(at) as i64;
        let res = conn.execute(
            &format!("INSERT INTO {}(name, created_at, updated_at) VALUES (?1, ?2, ?3)", kind.table()),
            params![name.as_str(), secs, secs],
        );
        match res {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                // Stored precision is seconds; match what find_all will return.
                let at = secs_to_system_time(secs as u64);
                Ok(CatalogEntity::new(id as u64, name.clone(), at))
            }
            Err(e) => {
                if let rusqlite::Error::SqliteFailure(err, _) = &e { if err.code == rusqlite::ErrorCode::ConstraintViolation { return Err(CoreError::AlreadyExists); } }
                Err(map_sqerr(e))
            }
        }
    }

    fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let mut stmt = conn
            .prepare(&format!("SELECT id, name, created_at, updated_at FROM {} ORDER BY id ASC", kind.table()))
            .map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row_to_entity(row)?);
        }
        Ok(out)
    }
}
