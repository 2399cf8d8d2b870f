//! Presentation snapshots of a grade matrix.
//!
//! # Responsibility
//! - `GridView`: the admin-editable grid, one entry per loaded topic.
//! - `HoverCard`: the read-only per-student summary, present cells only.
//!
//! # Invariants
//! - Snapshots are owned copies; editing the matrix never changes them.
//! - Column order follows topic display order.

use crate::matrix::GradeMatrix;
use crate::model::dimension::{Course, CourseId, Semester, SemesterId, Student, Topic, TopicId};
use crate::model::scale::SeverityBand;
use crate::service::stats::{average_for, topic_average, Average};
use serde::Serialize;

/// Column header of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicHeader {
    pub topic_id: TopicId,
    pub name: String,
    pub average: Average,
}

/// One rendered grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCellView {
    pub topic_id: TopicId,
    pub score: Option<f64>,
    pub comment: Option<String>,
    pub band: Option<SeverityBand>,
    /// Edited since the last load or save.
    pub pending: bool,
}

/// One student row of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub student: Student,
    pub cells: Vec<GridCellView>,
    pub average: Average,
}

/// Admin-editable grid for one course semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridView {
    pub course_id: CourseId,
    pub semester_id: SemesterId,
    pub topics: Vec<TopicHeader>,
    pub rows: Vec<GridRow>,
}

impl GridView {
    pub fn build(
        course: &Course,
        semester: &Semester,
        topics: &[Topic],
        students: &[Student],
        matrix: &GradeMatrix,
    ) -> Self {
        let topic_ids = || topics.iter().map(|topic| topic.id.as_str());
        let scale = matrix.scale();

        let headers = topics
            .iter()
            .map(|topic| TopicHeader {
                topic_id: topic.id.clone(),
                name: topic.name.clone(),
                average: topic_average(
                    matrix,
                    &topic.id,
                    students.iter().map(|student| student.id.as_str()),
                ),
            })
            .collect();

        let rows = students
            .iter()
            .map(|student| {
                let cells = topics
                    .iter()
                    .map(|topic| {
                        let cell = matrix.get(&student.id, &topic.id);
                        let score = cell.and_then(|cell| cell.score);
                        GridCellView {
                            topic_id: topic.id.clone(),
                            score,
                            comment: cell.and_then(|cell| cell.comment.clone()),
                            band: score.map(|value| scale.band(value)),
                            pending: matrix.is_pending(&student.id, &topic.id),
                        }
                    })
                    .collect();
                GridRow {
                    student: student.clone(),
                    cells,
                    average: average_for(matrix, &student.id, topic_ids()),
                }
            })
            .collect();

        Self {
            course_id: course.id.clone(),
            semester_id: semester.id.clone(),
            topics: headers,
            rows,
        }
    }
}

/// One scored or commented topic on a hover card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverEntry {
    pub topic_name: String,
    pub score: Option<f64>,
    pub band: Option<SeverityBand>,
    pub comment: Option<String>,
}

/// Read-only grade summary for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverCard {
    pub student: Student,
    pub entries: Vec<HoverEntry>,
    pub average: Average,
}

impl HoverCard {
    pub fn build(student: &Student, topics: &[Topic], matrix: &GradeMatrix) -> Self {
        let scale = matrix.scale();
        let entries = topics
            .iter()
            .filter_map(|topic| {
                let cell = matrix.get(&student.id, &topic.id)?;
                if !cell.has_content() {
                    return None;
                }
                Some(HoverEntry {
                    topic_name: topic.name.clone(),
                    score: cell.score,
                    band: cell.score.map(|value| scale.band(value)),
                    comment: cell.comment.clone(),
                })
            })
            .collect();

        Self {
            student: student.clone(),
            entries,
            average: average_for(
                matrix,
                &student.id,
                topics.iter().map(|topic| topic.id.as_str()),
            ),
        }
    }
}
