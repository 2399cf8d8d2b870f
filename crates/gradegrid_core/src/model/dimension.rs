//! Dimension records forming the axes of a grade matrix.
//!
//! # Responsibility
//! - Describe courses, semesters, topics and students as plain records.
//!
//! # Invariants
//! - Records are immutable from the engine's point of view.
//! - `Topic::order` is used for column display order only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque course identifier.
pub type CourseId = String;
/// Opaque semester identifier.
pub type SemesterId = String;
/// Opaque topic identifier.
pub type TopicId = String;
/// Opaque student identifier.
pub type StudentId = String;

/// Course whose enrolled students form the row axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
}

/// Semester of a course; selects which topics form the column axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub id: SemesterId,
    pub course_id: CourseId,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

/// Gradable topic (one matrix column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub semester_id: SemesterId,
    pub course_id: CourseId,
    pub name: String,
    /// Column position; lower values render first.
    pub order: i64,
}

/// Enrolled student (one matrix row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub display_name: String,
    /// Institutional student number shown next to the name.
    pub student_number: String,
}
