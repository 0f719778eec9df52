//! Database module for the chat relay
//!
//! Write-only log of interactions in SQLite.

mod schema;

pub use schema::*;

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
    #[error("Database task failed: {0}")]
    Join(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database
    #[cfg(test)]
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Record one interaction, replacing any row with the same key
    pub fn record_interaction(&self, interaction: &Interaction) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO interactions
                 (conversation_id, timestamp, session_id, user_message, bot_response, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?2)",
            params![
                interaction.conversation_id(),
                interaction.created_at,
                interaction.session_id,
                interaction.question_text,
                interaction.answer_text,
            ],
        )?;
        Ok(())
    }

    /// All interactions for a session, oldest first
    #[cfg(test)]
    pub fn interactions_for_session(&self, session_id: &str) -> DbResult<Vec<Interaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT session_id, user_message, bot_response, created_at
             FROM interactions WHERE session_id = ?1
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            Ok(Interaction {
                session_id: row.get(0)?,
                question_text: row.get(1)?,
                answer_text: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let interactions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(interactions)
    }
}
