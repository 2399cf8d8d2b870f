//! Grade cell and persisted grade row shapes.
//!
//! # Responsibility
//! - Define the in-memory cell value object and its natural key.
//! - Define the row shapes exchanged with the storage collaborator.
//!
//! # Invariants
//! - A cell with no score and no comment carries no information to persist.
//! - `persisted_id` is only ever taken from storage, never generated here.

use crate::model::dimension::{CourseId, StudentId, TopicId};
use serde::{Deserialize, Serialize};

/// Opaque storage identifier of one grade row.
pub type GradeRowId = String;

/// Natural key of a grade cell within one course.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GradeKey {
    pub student_id: StudentId,
    pub topic_id: TopicId,
}

impl GradeKey {
    pub fn new(student_id: impl Into<StudentId>, topic_id: impl Into<TopicId>) -> Self {
        Self {
            student_id: student_id.into(),
            topic_id: topic_id.into(),
        }
    }
}

/// Editable score and comment for one (student, topic) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeCell {
    /// Clamped score; `None` means no entry, never zero.
    pub score: Option<f64>,
    /// Trimmed non-empty comment.
    pub comment: Option<String>,
    /// Backing row id when this cell was seeded from storage.
    pub persisted_id: Option<GradeRowId>,
}

impl GradeCell {
    /// Returns whether the cell holds a score or a non-empty comment.
    pub fn has_content(&self) -> bool {
        self.score.is_some() || self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Returns whether a backing row existed at the last seed.
    pub fn is_known(&self) -> bool {
        self.persisted_id.is_some()
    }
}

/// Grade row as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    pub id: GradeRowId,
    pub student_id: StudentId,
    pub topic_id: TopicId,
    pub score: Option<f64>,
    pub comment: Option<String>,
}

impl GradeRow {
    pub fn key(&self) -> GradeKey {
        GradeKey::new(self.student_id.clone(), self.topic_id.clone())
    }
}

/// Insert payload for a cell that has no backing row yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGradeRow {
    pub student_id: StudentId,
    pub topic_id: TopicId,
    pub course_id: CourseId,
    pub score: Option<f64>,
    pub comment: Option<String>,
}

/// Update payload for a cell whose backing row is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRowUpdate {
    pub id: GradeRowId,
    pub score: Option<f64>,
    pub comment: Option<String>,
}
