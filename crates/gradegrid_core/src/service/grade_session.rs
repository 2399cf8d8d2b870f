//! Grade editing session for one course.
//!
//! # Responsibility
//! - Load dimensions and seed the matrix for the selected semester.
//! - Route cell edits through the `CellEditor`.
//! - Reconcile pending edits against freshly read rows and write them back
//!   as one update batch and one insert batch.
//!
//! # Invariants
//! - A failed load leaves the previously loaded semester untouched.
//! - `save` takes `&mut self`, so saves on one session never overlap.
//! - The persisted index is rebuilt from storage on every save.
//! - Any save failure leaves the matrix unseeded with its pending edits.
//! - A stale row id is reported, never retried as an insert.
//! - Clearing a persisted cell is written as an update with no score and no
//!   comment; rows are never created for empty cells.

use crate::config::EngineConfig;
use crate::matrix::GradeMatrix;
use crate::model::dimension::{Course, Semester, Student, Topic, TopicId};
use crate::model::grade::{GradeCell, GradeKey, GradeRowId, GradeRowUpdate, NewGradeRow};
use crate::model::scale::SeverityBand;
use crate::reconcile::{partition, PersistedIndex};
use crate::repo::dimension_repo::DimensionRepository;
use crate::repo::grade_repo::{GradeRepository, RepoError};
use crate::service::cell_editor::CellEditor;
use crate::service::stats::{self, Average};
use crate::view::{GridView, HoverCard};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from loading session dimensions or grade rows.
#[derive(Debug)]
pub enum SessionError {
    /// Semester id is not one of the course's semesters.
    UnknownSemester(String),
    /// Storage read failed; `what` names the failed load.
    Load {
        what: &'static str,
        source: RepoError,
    },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSemester(id) => write!(f, "semester not found in course: {id}"),
            Self::Load { what, source } => write!(f, "failed to load {what}: {source}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load { source, .. } => Some(source),
            Self::UnknownSemester(_) => None,
        }
    }
}

/// Which write batch an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Update,
    Insert,
}

impl Display for BatchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Insert => f.write_str("insert"),
        }
    }
}

/// Row counts written by a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub updated: usize,
    pub inserted: usize,
}

impl SaveReport {
    pub fn is_empty(&self) -> bool {
        self.updated == 0 && self.inserted == 0
    }
}

/// Save failures; none of them re-seed the matrix.
#[derive(Debug)]
pub enum SaveError {
    /// No semester selected, nothing to reconcile.
    NoSemesterSelected,
    /// Reading persisted rows for the index failed; nothing was written.
    IndexRead(RepoError),
    /// The first attempted batch failed; nothing was written.
    NothingWritten { failed: BatchKind, source: RepoError },
    /// One batch was applied, the other failed.
    PartiallyWritten {
        applied: BatchKind,
        applied_rows: usize,
        failed: BatchKind,
        source: RepoError,
    },
    /// Every batch was applied but re-reading rows for the re-seed failed.
    Refresh { report: SaveReport, source: RepoError },
}

impl SaveError {
    /// Row ids the store reported as gone during the update batch.
    pub fn stale_row_ids(&self) -> Option<&[GradeRowId]> {
        match self {
            Self::NothingWritten {
                source: RepoError::StaleRowIds(ids),
                ..
            }
            | Self::PartiallyWritten {
                source: RepoError::StaleRowIds(ids),
                ..
            } => Some(ids.as_slice()),
            _ => None,
        }
    }

    /// Whether any row may have been written before the failure.
    pub fn wrote_anything(&self) -> bool {
        matches!(self, Self::PartiallyWritten { .. } | Self::Refresh { .. })
    }
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSemesterSelected => write!(f, "no semester selected"),
            Self::IndexRead(err) => write!(f, "failed to read persisted grades: {err}"),
            Self::NothingWritten { failed, source } => {
                write!(f, "{failed} batch failed, nothing written: {source}")
            }
            Self::PartiallyWritten {
                applied,
                applied_rows,
                failed,
                source,
            } => write!(
                f,
                "{applied} batch applied ({applied_rows} rows) but {failed} batch failed: {source}"
            ),
            Self::Refresh { report, source } => write!(
                f,
                "grades saved ({} updated, {} inserted) but reload failed: {source}",
                report.updated, report.inserted
            ),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoSemesterSelected => None,
            Self::IndexRead(source)
            | Self::NothingWritten { source, .. }
            | Self::PartiallyWritten { source, .. }
            | Self::Refresh { source, .. } => Some(source),
        }
    }
}

struct SemesterView {
    semester: Semester,
    topics: Vec<Topic>,
}

/// Single-editor session over one course's grade matrix.
pub struct GradeSession<R> {
    repo: R,
    editor: CellEditor,
    config: EngineConfig,
    course: Course,
    students: Vec<Student>,
    semesters: Vec<Semester>,
    selected: Option<SemesterView>,
    matrix: GradeMatrix,
}

impl<R: GradeRepository + DimensionRepository> GradeSession<R> {
    /// Opens a session for `course`, loading its students and semesters.
    pub fn open(repo: R, config: EngineConfig, course: Course) -> Result<Self, SessionError> {
        let students = repo
            .load_enrolled_students(&course.id)
            .map_err(|source| load_failed("enrolled students", &course.id, source))?;
        let semesters = repo
            .load_semesters(&course.id)
            .map_err(|source| load_failed("semesters", &course.id, source))?;

        info!(
            "event=session_open module=service status=ok course_id={} students={} semesters={}",
            course.id,
            students.len(),
            semesters.len()
        );

        let matrix = GradeMatrix::new(config.score_scale());
        Ok(Self {
            editor: CellEditor::from_config(&config),
            repo,
            config,
            course,
            students,
            semesters,
            selected: None,
            matrix,
        })
    }

    /// Loads topics and grade rows of `semester_id` and replaces the matrix.
    ///
    /// Pending edits of the previous semester are discarded on success.
    pub fn select_semester(&mut self, semester_id: &str) -> Result<(), SessionError> {
        let semester = self
            .semesters
            .iter()
            .find(|semester| semester.id == semester_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSemester(semester_id.to_string()))?;

        let started_at = Instant::now();
        let topics = self
            .repo
            .load_topics(&semester.id)
            .map_err(|source| load_failed("topics", &semester.id, source))?;
        let topic_ids = topic_ids(&topics);
        let rows = self
            .repo
            .list_grade_rows(&self.course.id, &topic_ids)
            .map_err(|source| load_failed("grade rows", &semester.id, source))?;

        if self.matrix.has_pending_edits() {
            warn!(
                "event=semester_load module=service status=warn discarded_edits={}",
                self.matrix.pending_count()
            );
        }
        self.matrix = GradeMatrix::seeded(self.config.score_scale(), &rows);
        info!(
            "event=semester_load module=service status=ok course_id={} semester_id={} topics={} rows={} duration_ms={}",
            self.course.id,
            semester.id,
            topics.len(),
            rows.len(),
            started_at.elapsed().as_millis()
        );
        self.selected = Some(SemesterView { semester, topics });
        Ok(())
    }

    /// Re-reads the selected semester, discarding pending edits.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        match self.selected.as_ref().map(|view| view.semester.id.clone()) {
            Some(semester_id) => self.select_semester(&semester_id),
            None => Ok(()),
        }
    }

    /// Reconciles pending edits with storage and re-seeds on success.
    pub fn save(&mut self) -> Result<SaveReport, SaveError> {
        let Some(view) = self.selected.as_ref() else {
            return Err(SaveError::NoSemesterSelected);
        };
        let started_at = Instant::now();
        let topic_ids = topic_ids(&view.topics);

        let persisted = self
            .repo
            .list_grade_rows(&self.course.id, &topic_ids)
            .map_err(|err| save_failed(SaveError::IndexRead(err)))?;
        let index = PersistedIndex::build(&persisted, |row| row.key(), |row| row.id.clone());
        if index.duplicate_rows() > 0 {
            warn!(
                "event=grade_save module=service status=warn duplicate_rows={}",
                index.duplicate_rows()
            );
        }

        let pending = self
            .matrix
            .pending_cells()
            .filter(|entry| entry.cell.has_content() || entry.cell.is_known())
            .map(|entry| (entry.key(), entry.cell.clone()));
        let split = partition(pending, &index);

        let updates: Vec<GradeRowUpdate> = split
            .updates
            .into_iter()
            .map(|(id, cell)| GradeRowUpdate {
                id,
                score: cell.score,
                comment: cell.comment,
            })
            .collect();
        // A cleared cell whose row is already gone has nothing left to write.
        let inserts: Vec<NewGradeRow> = split
            .inserts
            .into_iter()
            .filter(|(_, cell)| cell.has_content())
            .map(|(key, cell)| new_row(&self.course.id, key, cell))
            .collect();

        let mut report = SaveReport::default();
        if !updates.is_empty() {
            self.repo.update_grade_rows(&updates).map_err(|source| {
                save_failed(SaveError::NothingWritten {
                    failed: BatchKind::Update,
                    source,
                })
            })?;
            report.updated = updates.len();
        }

        if !inserts.is_empty() {
            let ids = self.repo.insert_grade_rows(&inserts).map_err(|source| {
                save_failed(if report.updated > 0 {
                    SaveError::PartiallyWritten {
                        applied: BatchKind::Update,
                        applied_rows: report.updated,
                        failed: BatchKind::Insert,
                        source,
                    }
                } else {
                    SaveError::NothingWritten {
                        failed: BatchKind::Insert,
                        source,
                    }
                })
            })?;
            if ids.len() != inserts.len() {
                warn!(
                    "event=grade_save module=service status=warn requested_inserts={} returned_ids={}",
                    inserts.len(),
                    ids.len()
                );
            }
            report.inserted = inserts.len();
        }

        let refreshed = self
            .repo
            .list_grade_rows(&self.course.id, &topic_ids)
            .map_err(|source| save_failed(SaveError::Refresh { report, source }))?;
        self.matrix.seed(&refreshed);

        info!(
            "event=grade_save module=service status=ok course_id={} updated={} inserted={} duration_ms={}",
            self.course.id,
            report.updated,
            report.inserted,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Normalizes and applies a score edit; see `CellEditor::edit_cell`.
    ///
    /// Edits outside the loaded students/topics are ignored.
    pub fn edit_cell(&mut self, student_id: &str, topic_id: &str, raw_input: &str) -> Option<f64> {
        if !self.is_visible_cell(student_id, topic_id) {
            debug!("event=cell_edit module=service status=ignored reason=outside_matrix");
            return None;
        }
        self.editor
            .edit_cell(&mut self.matrix, student_id, topic_id, raw_input)
    }

    /// Normalizes and applies a comment edit; see `CellEditor::edit_comment`.
    pub fn edit_comment(
        &mut self,
        student_id: &str,
        topic_id: &str,
        raw_comment: &str,
    ) -> Option<String> {
        if !self.is_visible_cell(student_id, topic_id) {
            debug!("event=comment_edit module=service status=ignored reason=outside_matrix");
            return None;
        }
        self.editor
            .edit_comment(&mut self.matrix, student_id, topic_id, raw_comment)
    }

    pub fn get(&self, student_id: &str, topic_id: &str) -> Option<&GradeCell> {
        self.matrix.get(student_id, topic_id)
    }

    /// Mean of the student's present scores over the loaded topics.
    pub fn average_for(&self, student_id: &str) -> Average {
        stats::average_for(
            &self.matrix,
            student_id,
            self.topics().iter().map(|topic| topic.id.as_str()),
        )
    }

    /// Mean of present scores in one topic over enrolled students.
    pub fn topic_average(&self, topic_id: &str) -> Average {
        stats::topic_average(
            &self.matrix,
            topic_id,
            self.students.iter().map(|student| student.id.as_str()),
        )
    }

    pub fn severity_band(&self, score: f64) -> SeverityBand {
        self.matrix.scale().band(score)
    }

    /// Editable grid snapshot of the selected semester.
    pub fn grid_view(&self) -> Option<GridView> {
        let view = self.selected.as_ref()?;
        Some(GridView::build(
            &self.course,
            &view.semester,
            &view.topics,
            &self.students,
            &self.matrix,
        ))
    }

    /// Read-only summary card for one enrolled student.
    pub fn hover_card(&self, student_id: &str) -> Option<HoverCard> {
        let student = self.students.iter().find(|student| student.id == student_id)?;
        Some(HoverCard::build(student, self.topics(), &self.matrix))
    }

    pub fn matrix(&self) -> &GradeMatrix {
        &self.matrix
    }

    pub fn has_pending_edits(&self) -> bool {
        self.matrix.has_pending_edits()
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn semesters(&self) -> &[Semester] {
        &self.semesters
    }

    pub fn selected_semester(&self) -> Option<&Semester> {
        self.selected.as_ref().map(|view| &view.semester)
    }

    /// Topics of the selected semester in display order.
    pub fn topics(&self) -> &[Topic] {
        match &self.selected {
            Some(view) => &view.topics,
            None => &[],
        }
    }

    fn is_visible_cell(&self, student_id: &str, topic_id: &str) -> bool {
        self.students.iter().any(|student| student.id == student_id)
            && self.topics().iter().any(|topic| topic.id == topic_id)
    }
}

fn topic_ids(topics: &[Topic]) -> Vec<TopicId> {
    topics.iter().map(|topic| topic.id.clone()).collect()
}

fn new_row(course_id: &str, key: GradeKey, cell: GradeCell) -> NewGradeRow {
    NewGradeRow {
        student_id: key.student_id,
        topic_id: key.topic_id,
        course_id: course_id.to_string(),
        score: cell.score,
        comment: cell.comment,
    }
}

fn load_failed(what: &'static str, id: &str, source: RepoError) -> SessionError {
    error!(
        "event=dimension_load module=service status=error what={} id={} error={}",
        what, id, source
    );
    SessionError::Load { what, source }
}

fn save_failed(err: SaveError) -> SaveError {
    error!(
        "event=grade_save module=service status=error wrote_anything={} error={}",
        err.wrote_anything(),
        err
    );
    err
}
