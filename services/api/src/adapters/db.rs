//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qa_relay_core::domain::{NewQuestion, Question, User, UserCredentials};
use qa_relay_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            hashed_password: self.password,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    user_id: Uuid,
    email: String,
    content: String,
    ip: Option<String>,
    answer: Option<String>,
    created_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.id,
            user_id: self.user_id,
            email: self.email,
            content: self.content,
            ip: self.ip,
            answer: self.answer,
            created_at: self.created_at,
        }
    }
}

const QUESTION_COLUMNS: &str = "id, user_id, email, content, ip, answer, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(CredentialsRecord::to_domain))
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, password, created_at) VALUES ($1, $2, $3, $4) RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict("Email already registered".to_string())
            }
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn list_unanswered_questions(&self) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(&format!(
            "SELECT {} FROM questions WHERE answer IS NULL ORDER BY created_at DESC",
            QUESTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let questions = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(questions)
    }

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(&format!(
            "INSERT INTO questions (id, user_id, email, content, ip) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(question.user_id)
        .bind(question.email)
        .bind(question.content)
        .bind(question.ip)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn answer_question(&self, question_id: Uuid, answer: &str) -> PortResult<Question> {
        // Conditional update: a second writer finds no row to update.
        let updated = sqlx::query_as::<_, QuestionRecord>(&format!(
            "UPDATE questions SET answer = $1 WHERE id = $2 AND answer IS NULL RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(answer)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = updated {
            return Ok(record.to_domain());
        }

        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        match exists {
            Some(_) => Err(PortError::Conflict(format!(
                "Question {} has already been answered",
                question_id
            ))),
            None => Err(PortError::NotFound(format!(
                "Question {} not found",
                question_id
            ))),
        }
    }
}
