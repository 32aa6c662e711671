//! SQLite database operations
//!
//! All database access goes through this module. The schema is created
//! in code at connect time, so a fresh database file is usable without
//! any external bootstrap step.

use std::str::FromStr;

use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Schema statements, executed in order at connect time.
///
/// sqlx prepares statements individually, so this is a list rather than
/// one batched script. Table defaults reference the same constants the
/// application code uses.
fn schema_statements() -> Vec<String> {
    vec![
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                image_url TEXT NOT NULL DEFAULT '{default_image}',
                header_image_url TEXT NOT NULL DEFAULT '{default_header}',
                bio TEXT,
                location TEXT
            )
            "#,
            default_image = DEFAULT_IMAGE_URL,
            default_header = DEFAULT_HEADER_IMAGE_URL,
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL CHECK (length(text) <= {max_chars}),
                created_at TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            max_chars = MESSAGE_MAX_CHARS,
        ),
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (follower_id, followed_id)
        )
        "#
        .to_string(),
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, message_id)
        )
        "#
        .to_string(),
        "CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_follows_followed_id ON follows(followed_id)".to_string(),
        "CREATE INDEX IF NOT EXISTS idx_likes_message_id ON likes(message_id)".to_string(),
    ]
}

/// Separate constraint violations from transport failures.
///
/// Unique, not-null, foreign-key and check violations become
/// [`AppError::Integrity`] so callers can react to a failed commit of
/// staged data; everything else stays a database error.
fn map_integrity(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if matches!(
            db_error.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::CheckViolation
        ) {
            return AppError::Integrity(db_error.message().to_string());
        }
    }
    AppError::Database(error)
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Database {
    /// Open (creating if missing) the database at `url` and ensure the
    /// schema exists.
    ///
    /// Foreign key enforcement is switched on for every pooled
    /// connection; the cascade rules depend on it.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Config(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        for statement in schema_statements() {
            sqlx::query(&statement).execute(&pool).await?;
        }

        tracing::info!("Database connected and schema ensured");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Commit a staged user.
    ///
    /// This is where uniqueness and non-null constraints are enforced:
    /// a duplicate or missing username/email surfaces as
    /// [`AppError::Integrity`] here, never at staging time.
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, image_url)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_integrity)?;

        Ok(user)
    }

    /// Commit several staged users atomically.
    ///
    /// All inserts run in one transaction: if any staged user violates a
    /// constraint, none of them are persisted.
    pub async fn insert_users(&self, new_users: &[NewUser]) -> Result<Vec<User>, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<Vec<User>, AppError> = async {
            let mut users = Vec::with_capacity(new_users.len());
            for new_user in new_users {
                let user = sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (username, email, password_hash, image_url)
                    VALUES (?, ?, ?, ?)
                    RETURNING *
                    "#,
                )
                .bind(&new_user.username)
                .bind(&new_user.email)
                .bind(&new_user.password_hash)
                .bind(&new_user.image_url)
                .fetch_one(&mut *conn)
                .await
                .map_err(map_integrity)?;
                users.push(user);
            }
            Ok(users)
        }
        .await;

        match result {
            Ok(users) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(users)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by exact (case-sensitive) username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Case-insensitive substring search on username.
    ///
    /// LIKE wildcards in the query are escaped so they match literally.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        let pattern = format!("%{}%", escape_like(query));
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username LIKE ? ESCAPE '\\' ORDER BY id",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update a user's profile fields
    pub async fn update_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, image_url = ?, header_image_url = ?,
                bio = ?, location = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.image_url)
        .bind(&user.header_image_url)
        .bind(&user.bio)
        .bind(&user.location)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(map_integrity)?;

        Ok(())
    }

    /// Delete a user by ID.
    ///
    /// Cascades to the user's messages (and through them to likes), the
    /// user's own like rows, and follow edges on both sides.
    ///
    /// # Returns
    /// `true` if a row was deleted
    pub async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all users
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Commit a staged message, stamping it with the current time.
    pub async fn insert_message(&self, new_message: &NewMessage) -> Result<Message, AppError> {
        let created_at = chrono::Utc::now();
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (text, created_at, user_id)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_message.text)
        .bind(created_at)
        .bind(new_message.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_integrity)?;

        Ok(message)
    }

    /// Get a message by ID
    pub async fn get_message(&self, id: i64) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(message)
    }

    /// Get a message joined with its author's public fields
    pub async fn get_message_with_author(
        &self,
        id: i64,
    ) -> Result<Option<MessageWithAuthor>, AppError> {
        let message = sqlx::query_as::<_, MessageWithAuthor>(
            r#"
            SELECT m.id, m.text, m.created_at, m.user_id, u.username, u.image_url
            FROM messages m
            JOIN users u ON u.id = m.user_id
            WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Delete a message by ID.
    ///
    /// Cascades to like rows referencing it.
    ///
    /// # Returns
    /// `true` if a row was deleted
    pub async fn delete_message(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// A user's own messages, newest first
    pub async fn get_messages_for_user(&self, user_id: i64) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Home feed: messages by the user and everyone they follow,
    /// newest first, capped at `limit`.
    pub async fn get_feed_messages(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<MessageWithAuthor>, AppError> {
        let messages = sqlx::query_as::<_, MessageWithAuthor>(
            r#"
            SELECT m.id, m.text, m.created_at, m.user_id, u.username, u.image_url
            FROM messages m
            JOIN users u ON u.id = m.user_id
            WHERE m.user_id = ?
               OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Messages a user has liked, newest first
    pub async fn get_liked_messages(
        &self,
        user_id: i64,
    ) -> Result<Vec<MessageWithAuthor>, AppError> {
        let messages = sqlx::query_as::<_, MessageWithAuthor>(
            r#"
            SELECT m.id, m.text, m.created_at, m.user_id, u.username, u.image_url
            FROM messages m
            JOIN users u ON u.id = m.user_id
            JOIN likes l ON l.message_id = m.id
            WHERE l.user_id = ?
            ORDER BY m.created_at DESC, m.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Count all messages
    pub async fn count_messages(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Create a follow edge. Duplicate edges are a no-op.
    pub async fn insert_follow(&self, follower_id: i64, followed_id: i64) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(followed_id)
            .execute(&self.pool)
            .await
            .map_err(map_integrity)?;

        Ok(())
    }

    /// Remove a follow edge.
    ///
    /// # Returns
    /// `true` if an edge was removed
    pub async fn delete_follow(&self, follower_id: i64, followed_id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `user_id` follows `other_id`
    pub async fn is_following(&self, user_id: i64, other_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followed_id = ?)",
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Whether `user_id` is followed by `other_id` (mirror of
    /// [`Database::is_following`])
    pub async fn is_followed_by(&self, user_id: i64, other_id: i64) -> Result<bool, AppError> {
        self.is_following(other_id, user_id).await
    }

    /// Users that `user_id` follows, oldest account first
    pub async fn list_following(&self, user_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            JOIN follows f ON f.followed_id = u.id
            WHERE f.follower_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Users that follow `user_id`, oldest account first
    pub async fn list_followers(&self, user_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.*
            FROM users u
            JOIN follows f ON f.follower_id = u.id
            WHERE f.followed_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Toggle a like: remove it if present, create it otherwise.
    ///
    /// # Returns
    /// `true` if the message is liked after the call
    pub async fn toggle_like(&self, user_id: i64, message_id: i64) -> Result<bool, AppError> {
        let removed = sqlx::query("DELETE FROM likes WHERE user_id = ? AND message_id = ?")
            .bind(user_id)
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(map_integrity)?;

        Ok(true)
    }

    /// Count all like rows
    pub async fn count_likes(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Stats
    // =========================================================================

    /// The four profile stat counts for a user
    pub async fn get_user_stats(&self, user_id: i64) -> Result<UserStats, AppError> {
        let messages =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let following =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let followers =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followed_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let likes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(UserStats {
            messages,
            following,
            followers,
            likes,
        })
    }
}
