//! Dimension loader contract and SQLite implementation.
//!
//! # Responsibility
//! - Read courses, semesters, topics and enrolled students.
//!
//! # Invariants
//! - Every load returns a finite, deterministically ordered sequence.
//! - Loads never retry; failures go straight back to the caller.

use crate::model::dimension::{Course, Semester, Student, Topic};
use crate::repo::grade_repo::{ensure_connection_ready, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{Connection, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read-only source of matrix dimensions.
pub trait DimensionRepository {
    /// All courses, ordered by name.
    fn load_courses(&self) -> RepoResult<Vec<Course>>;
    /// Semesters of a course, ordered by start date.
    fn load_semesters(&self, course_id: &str) -> RepoResult<Vec<Semester>>;
    /// Topics of a semester, ordered by display order then name.
    fn load_topics(&self, semester_id: &str) -> RepoResult<Vec<Topic>>;
    /// Students enrolled in a course, ordered by display name.
    fn load_enrolled_students(&self, course_id: &str) -> RepoResult<Vec<Student>>;
}

impl<R: DimensionRepository + ?Sized> DimensionRepository for &R {
    fn load_courses(&self) -> RepoResult<Vec<Course>> {
        (**self).load_courses()
    }

    fn load_semesters(&self, course_id: &str) -> RepoResult<Vec<Semester>> {
        (**self).load_semesters(course_id)
    }

    fn load_topics(&self, semester_id: &str) -> RepoResult<Vec<Topic>> {
        (**self).load_topics(semester_id)
    }

    fn load_enrolled_students(&self, course_id: &str) -> RepoResult<Vec<Student>> {
        (**self).load_enrolled_students(course_id)
    }
}

/// SQLite-backed dimension loader.
pub struct SqliteDimensionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDimensionRepository<'conn> {
    /// Constructs a loader from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_all<T>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse(row)?);
        }
        Ok(items)
    }
}

impl DimensionRepository for SqliteDimensionRepository<'_> {
    fn load_courses(&self) -> RepoResult<Vec<Course>> {
        self.query_all(
            "SELECT id, name FROM courses ORDER BY name ASC, id ASC;",
            [],
            |row| {
                Ok(Course {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            },
        )
    }

    fn load_semesters(&self, course_id: &str) -> RepoResult<Vec<Semester>> {
        self.query_all(
            "SELECT id, course_id, name, starts_on, ends_on
             FROM semesters
             WHERE course_id = ?1
             ORDER BY starts_on ASC, id ASC;",
            [course_id],
            parse_semester_row,
        )
    }

    fn load_topics(&self, semester_id: &str) -> RepoResult<Vec<Topic>> {
        self.query_all(
            "SELECT id, semester_id, course_id, name, sort_order
             FROM topics
             WHERE semester_id = ?1
             ORDER BY sort_order ASC, name ASC, id ASC;",
            [semester_id],
            |row| {
                Ok(Topic {
                    id: row.get("id")?,
                    semester_id: row.get("semester_id")?,
                    course_id: row.get("course_id")?,
                    name: row.get("name")?,
                    order: row.get("sort_order")?,
                })
            },
        )
    }

    fn load_enrolled_students(&self, course_id: &str) -> RepoResult<Vec<Student>> {
        self.query_all(
            "SELECT s.id, s.display_name, s.student_number
             FROM students s
             INNER JOIN enrollments e ON e.student_id = s.id
             WHERE e.course_id = ?1
             ORDER BY s.display_name ASC, s.id ASC;",
            [course_id],
            |row| {
                Ok(Student {
                    id: row.get("id")?,
                    display_name: row.get("display_name")?,
                    student_number: row.get("student_number")?,
                })
            },
        )
    }
}

fn parse_semester_row(row: &Row<'_>) -> RepoResult<Semester> {
    let id: String = row.get("id")?;
    let starts_on = parse_date(&row.get::<_, String>("starts_on")?, "semesters.starts_on")?;
    let ends_on = parse_date(&row.get::<_, String>("ends_on")?, "semesters.ends_on")?;
    if ends_on < starts_on {
        return Err(RepoError::InvalidData(format!(
            "semester `{id}` ends on {ends_on} before it starts on {starts_on}"
        )));
    }

    Ok(Semester {
        id,
        course_id: row.get("course_id")?,
        name: row.get("name")?,
        starts_on,
        ends_on,
    })
}

fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}
