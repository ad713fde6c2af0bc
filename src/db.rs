use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{NewSearch, SearchRecord, SearchStatus};

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No password existed yet; the submitted one is now the master password.
    Initialized,
    Accepted,
    Rejected,
}

const SEARCH_COLUMNS: &str = "id, name, search_keywords, location, resume_last_updated_days,
     target_candidates, max_radius, recipient_email, user_prompt, system_prompt,
     status, results, created_at, completed_at";

impl Database {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        debug!(path = %path.display(), "opened database");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scout") {
            Ok(proj_dirs.data_dir().join("scout.db"))
        } else {
            Ok(PathBuf::from("scout.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS searches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                search_keywords TEXT NOT NULL,
                location TEXT,
                resume_last_updated_days INTEGER CHECK (resume_last_updated_days >= 0),
                target_candidates INTEGER CHECK (target_candidates >= 0),
                max_radius INTEGER CHECK (max_radius >= 0),
                recipient_email TEXT,
                user_prompt TEXT,
                system_prompt TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                results TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE TABLE IF NOT EXISTS master_auth (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_searches_created ON searches(created_at);
            CREATE INDEX IF NOT EXISTS idx_searches_status ON searches(status);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='searches'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'scout init' first."
            ));
        }
        Ok(())
    }

    // --- Auth ---

    /// First call stores `password_hash`; later calls compare against it.
    pub fn check_master_password(&self, password_hash: &str) -> Result<AuthOutcome> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT password_hash FROM master_auth ORDER BY id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read master password")?;

        match stored {
            None => {
                self.conn
                    .execute(
                        "INSERT INTO master_auth (password_hash) VALUES (?1)",
                        [password_hash],
                    )
                    .context("Failed to initialize authentication")?;
                info!("master password initialized");
                Ok(AuthOutcome::Initialized)
            }
            Some(hash) if hash == password_hash => Ok(AuthOutcome::Accepted),
            Some(_) => Ok(AuthOutcome::Rejected),
        }
    }

    // --- Search operations ---

    pub fn create_search(&self, search: &NewSearch) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO searches (name, search_keywords, location, resume_last_updated_days,
                    target_candidates, max_radius, recipient_email, user_prompt, system_prompt,
                    status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    search.name,
                    search.search_keywords,
                    search.location,
                    search.resume_last_updated_days,
                    search.target_candidates,
                    search.max_radius,
                    search.recipient_email,
                    search.user_prompt,
                    search.system_prompt,
                    SearchStatus::Pending.as_str(),
                    Utc::now(),
                ],
            )
            .context("Failed to create search")?;
        let id = self.conn.last_insert_rowid();
        info!(id, keywords = %search.search_keywords, "created search");
        Ok(id)
    }

    /// All searches, newest first.
    pub fn list_searches(&self) -> Result<Vec<SearchRecord>> {
        let sql = format!(
            "SELECT {} FROM searches ORDER BY created_at DESC, id DESC",
            SEARCH_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_search)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list searches")
    }

    pub fn get_search(&self, id: i64) -> Result<Option<SearchRecord>> {
        let sql = format!("SELECT {} FROM searches WHERE id = ?1", SEARCH_COLUMNS);
        self.conn
            .query_row(&sql, [id], Self::row_to_search)
            .optional()
            .with_context(|| format!("Failed to load search #{}", id))
    }

    pub fn mark_processing(&self, id: i64) -> Result<()> {
        self.transition(id, SearchStatus::Processing, None)
    }

    pub fn complete_with_results(&self, id: i64, results: &serde_json::Value) -> Result<()> {
        self.transition(id, SearchStatus::Completed, Some(results))
    }

    pub fn mark_failed(&self, id: i64) -> Result<()> {
        self.transition(id, SearchStatus::Failed, None)
    }

    /// Terminal searches are never moved again.
    fn transition(
        &self,
        id: i64,
        status: SearchStatus,
        results: Option<&serde_json::Value>,
    ) -> Result<()> {
        let completed_at = status.is_terminal().then(Utc::now);
        let updated = self.conn.execute(
            "UPDATE searches
             SET status = ?1, results = COALESCE(?2, results), completed_at = ?3
             WHERE id = ?4 AND status IN ('pending', 'processing')",
            params![status.as_str(), results, completed_at, id],
        )?;

        if updated == 0 {
            return match self.get_search(id)? {
                Some(search) => Err(anyhow!(
                    "Search #{} is already {} and cannot become {}",
                    id,
                    search.status,
                    status
                )),
                None => Err(anyhow!("Search #{} not found", id)),
            };
        }
        info!(id, status = %status, "search status updated");
        Ok(())
    }

    fn row_to_search(row: &rusqlite::Row) -> rusqlite::Result<SearchRecord> {
        Ok(SearchRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            search_keywords: row.get(2)?,
            location: row.get(3)?,
            resume_last_updated_days: row.get(4)?,
            target_candidates: row.get(5)?,
            max_radius: row.get(6)?,
            recipient_email: row.get(7)?,
            user_prompt: row.get(8)?,
            system_prompt: row.get(9)?,
            status: row.get(10)?,
            results: row.get(11)?,
            created_at: row.get(12)?,
            completed_at: row.get(13)?,
        })
    }
}
