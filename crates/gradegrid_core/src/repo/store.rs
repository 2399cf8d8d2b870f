//! Combined SQLite store handed to grade sessions.

use crate::model::dimension::{Course, Semester, Student, Topic, TopicId};
use crate::model::grade::{GradeRow, GradeRowId, GradeRowUpdate, NewGradeRow};
use crate::repo::dimension_repo::{DimensionRepository, SqliteDimensionRepository};
use crate::repo::grade_repo::{GradeRepository, RepoResult, SqliteGradeRepository};
use rusqlite::Connection;

/// Grade rows and dimensions over one SQLite connection.
pub struct SqliteGradeStore<'conn> {
    grades: SqliteGradeRepository<'conn>,
    dimensions: SqliteDimensionRepository<'conn>,
}

impl<'conn> SqliteGradeStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            grades: SqliteGradeRepository::try_new(conn)?,
            dimensions: SqliteDimensionRepository::try_new(conn)?,
        })
    }
}

impl GradeRepository for SqliteGradeStore<'_> {
    fn list_grade_rows(&self, course_id: &str, topic_ids: &[TopicId]) -> RepoResult<Vec<GradeRow>> {
        self.grades.list_grade_rows(course_id, topic_ids)
    }

    fn insert_grade_rows(&self, rows: &[NewGradeRow]) -> RepoResult<Vec<GradeRowId>> {
        self.grades.insert_grade_rows(rows)
    }

    fn update_grade_rows(&self, rows: &[GradeRowUpdate]) -> RepoResult<()> {
        self.grades.update_grade_rows(rows)
    }
}

impl DimensionRepository for SqliteGradeStore<'_> {
    fn load_courses(&self) -> RepoResult<Vec<Course>> {
        self.dimensions.load_courses()
    }

    fn load_semesters(&self, course_id: &str) -> RepoResult<Vec<Semester>> {
        self.dimensions.load_semesters(course_id)
    }

    fn load_topics(&self, semester_id: &str) -> RepoResult<Vec<Topic>> {
        self.dimensions.load_topics(semester_id)
    }

    fn load_enrolled_students(&self, course_id: &str) -> RepoResult<Vec<Student>> {
        self.dimensions.load_enrolled_students(course_id)
    }
}
