//! Company and credential store.
//!
//! A small SQLite database holding the companies a user may extract for,
//! the admin account, the application password, and an audit trail of
//! mutations. The store is opened by the host process and passed into
//! whatever needs it; nothing in this crate reaches for a global handle.

use crate::error::CoretaxError;
use crate::types::CompanyIdentity;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_APP_PASSWORD: &str = "indonesia123";

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Database location: `CORETAX_DB_PATH` when set, else the platform data dir.
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CORETAX_DB_PATH") {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coretax-extractor")
        .join("coretax.db")
}

pub struct CompanyStore {
    conn: Mutex<Connection>,
}

impl CompanyStore {
    /// Open (creating if needed) the store at `db_path` and seed default
    /// credentials on first use.
    pub fn new(db_path: PathBuf) -> Result<Self, CoretaxError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                npwp TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS admin (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS app_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                setting_key TEXT NOT NULL UNIQUE,
                setting_value TEXT NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                details TEXT,
                timestamp TEXT DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )?;

        let admin_count: i64 = conn.query_row("SELECT COUNT(*) FROM admin", [], |r| r.get(0))?;
        if admin_count == 0 {
            conn.execute(
                "INSERT INTO admin (username, password_hash) VALUES (?1, ?2)",
                params![DEFAULT_ADMIN_USERNAME, sha256_hex(DEFAULT_ADMIN_PASSWORD)],
            )?;
            log_action(&conn, "ADMIN_CREATED", "Default admin account created")?;
        }

        let app_pw_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM app_settings WHERE setting_key = 'app_password'",
            [],
            |r| r.get(0),
        )?;
        if app_pw_count == 0 {
            conn.execute(
                "INSERT INTO app_settings (setting_key, setting_value) VALUES ('app_password', ?1)",
                params![sha256_hex(DEFAULT_APP_PASSWORD)],
            )?;
            log_action(&conn, "APP_PASSWORD_CREATED", "Default app password created")?;
        }

        Ok(CompanyStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CoretaxError> {
        self.conn
            .lock()
            .map_err(|_| CoretaxError::Validation("Company store lock poisoned".to_string()))
    }

    pub fn get_all_companies(&self) -> Result<Vec<CompanyIdentity>, CoretaxError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, npwp FROM companies ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(CompanyIdentity {
                name: row.get(0)?,
                npwp: row.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn get_company_by_name(&self, name: &str) -> Result<Option<CompanyIdentity>, CoretaxError> {
        let conn = self.conn()?;
        let company = conn
            .query_row(
                "SELECT name, npwp FROM companies WHERE name = ?1",
                params![name],
                |row| {
                    Ok(CompanyIdentity {
                        name: row.get(0)?,
                        npwp: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(company)
    }

    pub fn add_company(&self, name: &str, npwp: &str) -> Result<(), CoretaxError> {
        let name = name.trim();
        let npwp = npwp.trim();
        validate_company(name, npwp)?;
        let conn = self.conn()?;
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM companies WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        if existing > 0 {
            return Err(CoretaxError::Validation(format!(
                "Company '{}' already exists",
                name
            )));
        }
        conn.execute(
            "INSERT INTO companies (name, npwp) VALUES (?1, ?2)",
            params![name, npwp],
        )?;
        log_action(
            &conn,
            "COMPANY_ADDED",
            &format!("{} (NPWP: {})", name, npwp),
        )?;
        Ok(())
    }

    pub fn update_company(
        &self,
        old_name: &str,
        new_name: &str,
        new_npwp: &str,
    ) -> Result<(), CoretaxError> {
        let new_name = new_name.trim();
        let new_npwp = new_npwp.trim();
        validate_company(new_name, new_npwp)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE companies SET name = ?1, npwp = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE name = ?3",
            params![new_name, new_npwp, old_name],
        )?;
        if changed == 0 {
            return Err(CoretaxError::CompanyNotFound(old_name.to_string()));
        }
        log_action(
            &conn,
            "COMPANY_UPDATED",
            &format!("{} -> {} (NPWP: {})", old_name, new_name, new_npwp),
        )?;
        Ok(())
    }

    pub fn delete_company(&self, name: &str) -> Result<(), CoretaxError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM companies WHERE name = ?1", params![name])?;
        if changed == 0 {
            return Err(CoretaxError::CompanyNotFound(name.to_string()));
        }
        log_action(&conn, "COMPANY_DELETED", name)?;
        Ok(())
    }

    pub fn get_admin_username(&self) -> Result<String, CoretaxError> {
        let conn = self.conn()?;
        let username: String =
            conn.query_row("SELECT username FROM admin LIMIT 1", [], |r| r.get(0))?;
        Ok(username)
    }

    pub fn verify_admin_password(&self, password: &str) -> Result<bool, CoretaxError> {
        let conn = self.conn()?;
        let stored: String =
            conn.query_row("SELECT password_hash FROM admin LIMIT 1", [], |r| r.get(0))?;
        Ok(stored == sha256_hex(password))
    }

    pub fn update_admin_password(&self, new_password: &str) -> Result<(), CoretaxError> {
        if new_password.trim().is_empty() {
            return Err(CoretaxError::Validation(
                "Password cannot be empty".to_string(),
            ));
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE admin SET password_hash = ?1, updated_at = CURRENT_TIMESTAMP",
            params![sha256_hex(new_password)],
        )?;
        log_action(&conn, "ADMIN_PASSWORD_CHANGED", "")?;
        Ok(())
    }

    pub fn update_admin_username(&self, new_username: &str) -> Result<(), CoretaxError> {
        let new_username = new_username.trim();
        if new_username.is_empty() {
            return Err(CoretaxError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE admin SET username = ?1, updated_at = CURRENT_TIMESTAMP",
            params![new_username],
        )?;
        log_action(&conn, "ADMIN_USERNAME_CHANGED", new_username)?;
        Ok(())
    }

    pub fn verify_app_password(&self, password: &str) -> Result<bool, CoretaxError> {
        let conn = self.conn()?;
        let stored: String = conn.query_row(
            "SELECT setting_value FROM app_settings WHERE setting_key = 'app_password'",
            [],
            |r| r.get(0),
        )?;
        Ok(stored == sha256_hex(password))
    }

    pub fn update_app_password(&self, new_password: &str) -> Result<(), CoretaxError> {
        if new_password.trim().is_empty() {
            return Err(CoretaxError::Validation(
                "Password cannot be empty".to_string(),
            ));
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE app_settings SET setting_value = ?1, updated_at = CURRENT_TIMESTAMP
             WHERE setting_key = 'app_password'",
            params![sha256_hex(new_password)],
        )?;
        log_action(&conn, "APP_PASSWORD_CHANGED", "")?;
        Ok(())
    }

    /// Most recent audit entries as `(action, details, timestamp)`.
    pub fn get_audit_log(
        &self,
        limit: usize,
    ) -> Result<Vec<(String, String, String)>, CoretaxError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT action, COALESCE(details, ''), timestamp FROM audit_log
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn validate_company(name: &str, npwp: &str) -> Result<(), CoretaxError> {
    if name.is_empty() {
        return Err(CoretaxError::Validation(
            "Company name cannot be empty".to_string(),
        ));
    }
    if npwp.is_empty() {
        return Err(CoretaxError::Validation("NPWP cannot be empty".to_string()));
    }
    if !npwp.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoretaxError::Validation(
            "NPWP must contain digits only".to_string(),
        ));
    }
    Ok(())
}

fn log_action(conn: &Connection, action: &str, details: &str) -> Result<(), CoretaxError> {
    conn.execute(
        "INSERT INTO audit_log (action, details) VALUES (?1, ?2)",
        params![action, details],
    )?;
    Ok(())
}
