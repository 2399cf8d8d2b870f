#![allow(dead_code)]

use gradegrid_core::{
    Course, DimensionRepository, GradeRepository, GradeRow, GradeRowId, GradeRowUpdate,
    NewGradeRow, RepoError, RepoResult, Semester, SqliteGradeStore, Student, Topic, TopicId,
};
use rusqlite::{params, Connection};
use std::cell::{Cell, RefCell};

pub const COURSE: &str = "C1";
pub const SPRING: &str = "SEM1";
pub const AUTUMN: &str = "SEM2";

/// Course C1 with students S1 (Ada) and S2 (Ben), topics T1/T2 in SEM1 and T3
/// in SEM2.
pub fn seed_course(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO courses (id, name) VALUES ('C1', 'Algebra');
         INSERT INTO semesters (id, course_id, name, starts_on, ends_on)
         VALUES ('SEM2', 'C1', 'Autumn', '2026-09-01', '2027-01-31'),
                ('SEM1', 'C1', 'Spring', '2026-02-01', '2026-06-30');
         INSERT INTO topics (id, semester_id, course_id, name, sort_order)
         VALUES ('T2', 'SEM1', 'C1', 'Series', 1),
                ('T1', 'SEM1', 'C1', 'Limits', 0),
                ('T3', 'SEM2', 'C1', 'Integrals', 0);
         INSERT INTO students (id, display_name, student_number)
         VALUES ('S2', 'Ben', '002'),
                ('S1', 'Ada', '001');
         INSERT INTO enrollments (course_id, student_id)
         VALUES ('C1', 'S1'), ('C1', 'S2');",
    )
    .unwrap();
}

pub fn insert_grade(
    conn: &Connection,
    id: &str,
    student_id: &str,
    topic_id: &str,
    score: Option<f64>,
    comment: Option<&str>,
    created_at: i64,
) {
    conn.execute(
        "INSERT INTO grades (id, course_id, student_id, topic_id, score, comment, created_at, updated_at)
         VALUES (?1, 'C1', ?2, ?3, ?4, ?5, ?6, ?6);",
        params![id, student_id, topic_id, score, comment, created_at],
    )
    .unwrap();
}

pub fn course() -> Course {
    Course {
        id: COURSE.to_string(),
        name: "Algebra".to_string(),
    }
}

pub fn stored_score(conn: &Connection, student_id: &str, topic_id: &str) -> Option<f64> {
    conn.query_row(
        "SELECT score FROM grades WHERE course_id = 'C1' AND student_id = ?1 AND topic_id = ?2;",
        params![student_id, topic_id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn grade_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM grades;", [], |row| row.get(0))
        .unwrap()
}

/// Store wrapper that records write batches and fails calls on demand.
pub struct ScriptedStore<'conn> {
    conn: &'conn Connection,
    inner: SqliteGradeStore<'conn>,
    pub fail_updates: Cell<bool>,
    pub fail_inserts: Cell<bool>,
    pub fail_topics: Cell<bool>,
    /// Number of grade-row listings that still succeed; `None` never fails.
    pub lists_before_failure: Cell<Option<usize>>,
    /// Row deleted right before the next update batch reaches storage.
    pub delete_before_update: RefCell<Option<String>>,
    pub updates: RefCell<Vec<Vec<GradeRowUpdate>>>,
    pub inserts: RefCell<Vec<Vec<NewGradeRow>>>,
}

impl<'conn> ScriptedStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            inner: SqliteGradeStore::try_new(conn).unwrap(),
            fail_updates: Cell::new(false),
            fail_inserts: Cell::new(false),
            fail_topics: Cell::new(false),
            lists_before_failure: Cell::new(None),
            delete_before_update: RefCell::new(None),
            updates: RefCell::new(Vec::new()),
            inserts: RefCell::new(Vec::new()),
        }
    }

    pub fn clear_recorded(&self) {
        self.updates.borrow_mut().clear();
        self.inserts.borrow_mut().clear();
    }
}

fn injected(call: &str) -> RepoError {
    RepoError::Unavailable(format!("injected {call} failure"))
}

impl GradeRepository for ScriptedStore<'_> {
    fn list_grade_rows(&self, course_id: &str, topic_ids: &[TopicId]) -> RepoResult<Vec<GradeRow>> {
        match self.lists_before_failure.get() {
            Some(0) => return Err(injected("list")),
            Some(remaining) => self.lists_before_failure.set(Some(remaining - 1)),
            None => {}
        }
        self.inner.list_grade_rows(course_id, topic_ids)
    }

    fn insert_grade_rows(&self, rows: &[NewGradeRow]) -> RepoResult<Vec<GradeRowId>> {
        self.inserts.borrow_mut().push(rows.to_vec());
        if self.fail_inserts.get() {
            return Err(injected("insert"));
        }
        self.inner.insert_grade_rows(rows)
    }

    fn update_grade_rows(&self, rows: &[GradeRowUpdate]) -> RepoResult<()> {
        self.updates.borrow_mut().push(rows.to_vec());
        if let Some(id) = self.delete_before_update.borrow_mut().take() {
            self.conn
                .execute("DELETE FROM grades WHERE id = ?1;", params![id])
                .unwrap();
        }
        if self.fail_updates.get() {
            return Err(injected("update"));
        }
        self.inner.update_grade_rows(rows)
    }
}

impl DimensionRepository for ScriptedStore<'_> {
    fn load_courses(&self) -> RepoResult<Vec<Course>> {
        self.inner.load_courses()
    }

    fn load_semesters(&self, course_id: &str) -> RepoResult<Vec<Semester>> {
        self.inner.load_semesters(course_id)
    }

    fn load_topics(&self, semester_id: &str) -> RepoResult<Vec<Topic>> {
        if self.fail_topics.get() {
            return Err(injected("topics"));
        }
        self.inner.load_topics(semester_id)
    }

    fn load_enrolled_students(&self, course_id: &str) -> RepoResult<Vec<Student>> {
        self.inner.load_enrolled_students(course_id)
    }
}
