//! Grade row repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose the three storage operations the save engine relies on:
//!   list rows, insert rows, update rows by id.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Each batch call is all-or-nothing on its own; no atomicity is promised
//!   across two separate calls.
//! - Updating an id that no longer exists fails with `StaleRowIds` and never
//!   falls back to an insert.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::dimension::TopicId;
use crate::model::grade::{GradeRow, GradeRowId, GradeRowUpdate, NewGradeRow};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by grade and dimension storage.
#[derive(Debug)]
pub enum RepoError {
    /// Database transport or SQL failure.
    Db(DbError),
    /// Connection is not migrated to the schema this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Update batch referenced row ids that no longer exist.
    StaleRowIds(Vec<GradeRowId>),
    /// Persisted data could not be decoded.
    InvalidData(String),
    /// Non-SQL storage backend is unreachable or refused the call.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "grade store schema version is {actual_version}, expected {expected_version}"
            ),
            Self::StaleRowIds(ids) => {
                write!(f, "grade rows no longer exist: {}", ids.join(", "))
            }
            Self::InvalidData(message) => write!(f, "invalid persisted grade data: {message}"),
            Self::Unavailable(message) => write!(f, "grade store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator for grade rows.
pub trait GradeRepository {
    /// Lists rows of `course_id` whose topic is one of `topic_ids`.
    ///
    /// Rows come back in a stable order (creation time, then id).
    fn list_grade_rows(&self, course_id: &str, topic_ids: &[TopicId]) -> RepoResult<Vec<GradeRow>>;
    /// Inserts rows and returns the generated ids.
    ///
    /// Callers must not rely on the ids lining up with the input order.
    fn insert_grade_rows(&self, rows: &[NewGradeRow]) -> RepoResult<Vec<GradeRowId>>;
    /// Overwrites score and comment of existing rows by id.
    fn update_grade_rows(&self, rows: &[GradeRowUpdate]) -> RepoResult<()>;
}

impl<R: GradeRepository + ?Sized> GradeRepository for &R {
    fn list_grade_rows(&self, course_id: &str, topic_ids: &[TopicId]) -> RepoResult<Vec<GradeRow>> {
        (**self).list_grade_rows(course_id, topic_ids)
    }

    fn insert_grade_rows(&self, rows: &[NewGradeRow]) -> RepoResult<Vec<GradeRowId>> {
        (**self).insert_grade_rows(rows)
    }

    fn update_grade_rows(&self, rows: &[GradeRowUpdate]) -> RepoResult<()> {
        (**self).update_grade_rows(rows)
    }
}

/// SQLite-backed grade repository.
pub struct SqliteGradeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGradeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Counts rows stored for one natural key.
    ///
    /// Diagnostic helper for spotting duplicated grades.
    pub fn count_rows_for_key(
        &self,
        course_id: &str,
        student_id: &str,
        topic_id: &str,
    ) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM grades
             WHERE course_id = ?1 AND student_id = ?2 AND topic_id = ?3;",
            params![course_id, student_id, topic_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl GradeRepository for SqliteGradeRepository<'_> {
    fn list_grade_rows(&self, course_id: &str, topic_ids: &[TopicId]) -> RepoResult<Vec<GradeRow>> {
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; topic_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, student_id, topic_id, score, comment
             FROM grades
             WHERE course_id = ?
               AND topic_id IN ({placeholders})
             ORDER BY created_at ASC, id ASC;"
        );
        let mut bind_values = Vec::with_capacity(topic_ids.len() + 1);
        bind_values.push(Value::Text(course_id.to_string()));
        bind_values.extend(topic_ids.iter().map(|id| Value::Text(id.clone())));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut grades = Vec::new();
        while let Some(row) = rows.next()? {
            grades.push(parse_grade_row(row)?);
        }
        Ok(grades)
    }

    fn insert_grade_rows(&self, rows: &[NewGradeRow]) -> RepoResult<Vec<GradeRowId>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO grades (id, course_id, student_id, topic_id, score, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for row in rows {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    row.course_id,
                    row.student_id,
                    row.topic_id,
                    row.score,
                    row.comment,
                ])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn update_grade_rows(&self, rows: &[GradeRowUpdate]) -> RepoResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut stale = Vec::new();
        {
            let mut stmt = tx.prepare(
                "UPDATE grades
                 SET score = ?2,
                     comment = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
            )?;
            for row in rows {
                let changed = stmt.execute(params![row.id, row.score, row.comment])?;
                if changed == 0 {
                    stale.push(row.id.clone());
                }
            }
        }

        if !stale.is_empty() {
            tx.rollback()?;
            return Err(RepoError::StaleRowIds(stale));
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_grade_row(row: &Row<'_>) -> RepoResult<GradeRow> {
    let id: String = row.get("id")?;
    let score: Option<f64> = row.get("score")?;
    if let Some(value) = score {
        if !value.is_finite() {
            return Err(RepoError::InvalidData(format!(
                "non-finite score `{value}` in grades.score for row `{id}`"
            )));
        }
    }

    Ok(GradeRow {
        id,
        student_id: row.get("student_id")?,
        topic_id: row.get("topic_id")?,
        score,
        comment: row.get("comment")?,
    })
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
