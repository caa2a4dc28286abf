use std::path::Path;

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{validate_username, AccountError, Credentials, SignupRequest, UserRecord};
use crate::util::running_average;

/// bcrypt work factor for stored passwords.
pub const DEFAULT_HASH_COST: u32 = 10;

/// SQLite-backed user table.
#[derive(Debug)]
pub struct AccountStore {
    conn: Connection,
    hash_cost: u32,
}

impl AccountStore {
    /// Open (or create) the database at `path` and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, AccountError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "account database opened");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, AccountError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AccountError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                name TEXT NOT NULL,
                races INTEGER NOT NULL DEFAULT 0,
                speed INTEGER NOT NULL DEFAULT 0,
                accuracy INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn,
            hash_cost: DEFAULT_HASH_COST,
        })
    }

    /// Lower work factor, for tests.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn is_username_available(&self, username: &str) -> Result<bool, AccountError> {
        if username.trim().is_empty() {
            return Err(AccountError::Invalid(
                "Username parameter is required".to_string(),
            ));
        }
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    pub fn signup(&self, req: &SignupRequest) -> Result<(), AccountError> {
        req.validate()?;
        if !self.is_username_available(&req.username)? {
            return Err(AccountError::UsernameTaken);
        }

        let hashed = bcrypt::hash(&req.password, self.hash_cost)?;
        let inserted = self.conn.execute(
            r#"
            INSERT INTO users (username, email, password, name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                req.username,
                req.email,
                hashed,
                req.name,
                Local::now().to_rfc3339()
            ],
        );
        match inserted {
            Ok(_) => {
                info!(username = %req.username, "account created");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AccountError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn login(&self, creds: &Credentials) -> Result<UserRecord, AccountError> {
        creds.validate()?;
        let hashed: Option<String> = self
            .conn
            .query_row(
                "SELECT password FROM users WHERE username = ?1",
                [&creds.username],
                |row| row.get(0),
            )
            .optional()?;

        let Some(hashed) = hashed else {
            return Err(AccountError::InvalidCredentials);
        };
        if !bcrypt::verify(&creds.password, &hashed)? {
            return Err(AccountError::InvalidCredentials);
        }

        info!(username = %creds.username, "login succeeded");
        self.get_user(&creds.username)?
            .ok_or_else(|| AccountError::UserNotFound(creds.username.clone()))
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        let user = self
            .conn
            .query_row(
                r#"
                SELECT username, name, email, races, speed, accuracy, created_at
                FROM users WHERE username = ?1
                "#,
                [username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Folds one race into the user's running averages.
    pub fn update_stats(
        &mut self,
        username: &str,
        wpm: u32,
        accuracy: u8,
    ) -> Result<UserRecord, AccountError> {
        validate_username(username)?;
        let tx = self.conn.transaction()?;
        let current: Option<(u32, u32, u32)> = tx
            .query_row(
                "SELECT races, speed, accuracy FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((races, speed, acc)) = current else {
            return Err(AccountError::UserNotFound(username.to_string()));
        };

        let new_speed = running_average(speed, races, wpm);
        let new_accuracy = running_average(acc, races, accuracy as u32);
        tx.execute(
            "UPDATE users SET races = ?1, speed = ?2, accuracy = ?3 WHERE username = ?4",
            params![races + 1, new_speed, new_accuracy, username],
        )?;
        tx.commit()?;

        debug!(username, races = races + 1, speed = new_speed, "stats updated");
        self.get_user(username)?
            .ok_or_else(|| AccountError::UserNotFound(username.to_string()))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let created: String = row.get(6)?;
    let member_since = DateTime::parse_from_rfc3339(&created)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                6,
                "created_at".to_string(),
                rusqlite::types::Type::Text,
            )
        })?
        .with_timezone(&Local);

    Ok(UserRecord {
        username: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        races: row.get(3)?,
        speed: row.get(4)?,
        accuracy: row.get(5)?,
        member_since,
    })
}
