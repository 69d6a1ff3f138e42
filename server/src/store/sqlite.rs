use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{IntakeRecord, IntakeSubmission};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store not configured: {0}")]
    Configuration(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Intake persistence over a lazily opened SQLite handle.
///
/// The handle is opened on first use. On any statement error it is
/// discarded, so the next call starts from a fresh connection.
pub struct IntakeStore {
    conn: Mutex<Option<Connection>>,
    connection_string: Option<String>,
    server: Option<String>,
    database: Option<String>,
}

impl IntakeStore {
    pub fn from_config(config: &Config) -> Self {
        Self {
            conn: Mutex::new(None),
            connection_string: config.sql_connection_string.clone(),
            server: config.sql_server.clone(),
            database: config.sql_database.clone(),
        }
    }

    /// Database location: an explicit connection string (with optional
    /// `sqlite:` prefix) wins; otherwise a path under `./data` derived
    /// from the server/database pair.
    fn location(&self) -> Result<PathBuf, StoreError> {
        if let Some(connection_string) = &self.connection_string {
            let path = connection_string
                .strip_prefix("sqlite:")
                .unwrap_or(connection_string);
            return Ok(PathBuf::from(path));
        }

        match (&self.server, &self.database) {
            (Some(server), Some(database)) => {
                Ok(PathBuf::from("data").join(format!("{}_{}.db", server, database)))
            }
            _ => Err(StoreError::Configuration(
                "SQL_CONNECTION_STRING or SQL_SERVER and SQL_DATABASE must be set".to_string(),
            )),
        }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let path = self.location()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let conn =
            Connection::open(&path).map_err(|e| StoreError::Database(e.to_string()))?;
        create_tables(&conn).map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!("Intake store ready at {}", path.display());

        Ok(conn)
    }

    /// Open the connection and run the idempotent schema statements.
    /// Safe to call on every start.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_conn(|_| Ok(()))
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if guard.is_none() {
            *guard = Some(self.connect()?);
        }
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::Database("connection unavailable".to_string()))?;

        match op(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                *guard = None;
                Err(StoreError::Database(e.to_string()))
            }
        }
    }

    /// Insert the user's intake row, or update it if one exists. Returns
    /// the row as stored.
    pub fn upsert(
        &self,
        user_id: &str,
        email: &str,
        form: &IntakeSubmission,
    ) -> Result<IntakeRecord, StoreError> {
        let now = Utc::now();

        self.with_conn(|conn| {
            let existing: Option<(String, String)> = conn
                .query_row(
                    "SELECT id, created_at FROM intake_forms WHERE user_id = ?1",
                    params![user_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (id, created_at) = match existing {
                Some((id, created_at)) => {
                    conn.execute(
                        "UPDATE intake_forms SET
                            email = ?1, first_name = ?2, last_name = ?3,
                            display_name = ?4, job_title = ?5, department = ?6,
                            office_location = ?7, address_line1 = ?8,
                            address_line2 = ?9, city = ?10, state_region = ?11,
                            postal_code = ?12, phone = ?13, mobile_phone = ?14,
                            updated_at = ?15
                         WHERE user_id = ?16",
                        params![
                            email,
                            form.first_name,
                            form.last_name,
                            form.display_name,
                            form.job_title,
                            form.department,
                            form.office_location,
                            form.address_line1,
                            form.address_line2,
                            form.city,
                            form.state_region,
                            form.postal_code,
                            form.phone,
                            form.mobile_phone,
                            now.to_rfc3339(),
                            user_id
                        ],
                    )?;
                    (id, created_at)
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    conn.execute(
                        "INSERT INTO intake_forms (
                            id, user_id, email, first_name, last_name,
                            display_name, job_title, department, office_location,
                            address_line1, address_line2, city, state_region,
                            postal_code, phone, mobile_phone, created_at, updated_at
                         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                                   ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                        params![
                            id,
                            user_id,
                            email,
                            form.first_name,
                            form.last_name,
                            form.display_name,
                            form.job_title,
                            form.department,
                            form.office_location,
                            form.address_line1,
                            form.address_line2,
                            form.city,
                            form.state_region,
                            form.postal_code,
                            form.phone,
                            form.mobile_phone,
                            now.to_rfc3339(),
                            now.to_rfc3339()
                        ],
                    )?;
                    tracing::info!(user_id = %user_id, "Created intake record");
                    (id, now.to_rfc3339())
                }
            };

            Ok(IntakeRecord {
                id,
                user_id: user_id.to_string(),
                email: email.to_string(),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                display_name: form.display_name.clone(),
                job_title: form.job_title.clone(),
                department: form.department.clone(),
                office_location: form.office_location.clone(),
                address_line1: form.address_line1.clone(),
                address_line2: form.address_line2.clone(),
                city: form.city.clone(),
                state_region: form.state_region.clone(),
                postal_code: form.postal_code.clone(),
                phone: form.phone.clone(),
                mobile_phone: form.mobile_phone.clone(),
                created_at: parse_timestamp(&created_at, now),
                updated_at: now,
            })
        })
    }

    pub fn get(&self, user_id: &str) -> Result<Option<IntakeRecord>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, email, first_name, last_name, display_name,
                        job_title, department, office_location, address_line1,
                        address_line2, city, state_region, postal_code, phone,
                        mobile_phone, created_at, updated_at
                 FROM intake_forms WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let now = Utc::now();
                    Ok(IntakeRecord {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        display_name: row.get(5)?,
                        job_title: row.get(6)?,
                        department: row.get(7)?,
                        office_location: row.get(8)?,
                        address_line1: row.get(9)?,
                        address_line2: row.get(10)?,
                        city: row.get(11)?,
                        state_region: row.get(12)?,
                        postal_code: row.get(13)?,
                        phone: row.get(14)?,
                        mobile_phone: row.get(15)?,
                        created_at: parse_timestamp(&row.get::<_, String>(16)?, now),
                        updated_at: parse_timestamp(&row.get::<_, String>(17)?, now),
                    })
                },
            )
            .optional()
        })
    }
}

fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS intake_forms (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            display_name TEXT,
            job_title TEXT,
            department TEXT,
            office_location TEXT,
            address_line1 TEXT,
            address_line2 TEXT,
            city TEXT,
            state_region TEXT,
            postal_code TEXT,
            phone TEXT,
            mobile_phone TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_intake_forms_updated_at
         ON intake_forms(updated_at)",
        [],
    )?;

    Ok(())
}

fn parse_timestamp(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> IntakeStore {
        IntakeStore {
            conn: Mutex::new(None),
            connection_string: Some("sqlite::memory:".to_string()),
            server: None,
            database: None,
        }
    }

    fn form(first_name: &str) -> IntakeSubmission {
        IntakeSubmission {
            first_name: Some(first_name.to_string()),
            city: Some("Tallahassee".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let store = memory_store();

        let first = store.upsert("u-1", "ana@example.com", &form("Ana")).unwrap();
        let second = store.upsert("u-1", "ana@example.com", &form("Anabel")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.first_name.as_deref(), Some("Anabel"));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let stored = store.get("u-1").unwrap().unwrap();
        assert_eq!(stored.first_name.as_deref(), Some("Anabel"));
    }

    #[test]
    fn test_get_unknown_user_is_none() {
        let store = memory_store();
        store.ensure_schema().unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_keeps_one_row_per_user() {
        let store = memory_store();

        store.upsert("u-1", "ana@example.com", &form("Ana")).unwrap();
        store.upsert("u-1", "ana@example.com", &form("Ana")).unwrap();
        store.upsert("u-2", "ben@example.com", &form("Ben")).unwrap();

        let count: i64 = {
            let guard = store.conn.lock().unwrap();
            let conn = guard.as_ref().unwrap();
            conn.query_row("SELECT COUNT(*) FROM intake_forms", [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(count, 2);
    }

    #[test]
    fn test_rows_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("intake.db");
        let connection_string = format!("sqlite:{}", path.display());

        let writer = IntakeStore {
            conn: Mutex::new(None),
            connection_string: Some(connection_string.clone()),
            server: None,
            database: None,
        };
        writer.upsert("u-1", "ana@example.com", &form("Ana")).unwrap();
        drop(writer);

        let reader = IntakeStore {
            conn: Mutex::new(None),
            connection_string: Some(connection_string),
            server: None,
            database: None,
        };
        let stored = reader.get("u-1").unwrap().unwrap();
        assert_eq!(stored.email, "ana@example.com");
    }

    #[test]
    fn test_missing_location_is_configuration_error() {
        let store = IntakeStore {
            conn: Mutex::new(None),
            connection_string: None,
            server: Some("srv".to_string()),
            database: None,
        };
        let err = store.ensure_schema().unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_location_strips_sqlite_prefix() {
        let store = IntakeStore {
            conn: Mutex::new(None),
            connection_string: Some("sqlite:data/intake.db".to_string()),
            server: None,
            database: None,
        };
        assert_eq!(store.location().unwrap(), PathBuf::from("data/intake.db"));
    }

    #[test]
    fn test_location_derives_from_server_and_database() {
        let store = IntakeStore {
            conn: Mutex::new(None),
            connection_string: None,
            server: Some("flwins-sql".to_string()),
            database: Some("intake".to_string()),
        };
        assert_eq!(
            store.location().unwrap(),
            PathBuf::from("data/flwins-sql_intake.db")
        );
    }
}
