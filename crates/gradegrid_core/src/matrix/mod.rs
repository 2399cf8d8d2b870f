//! In-memory grade matrix for one (course, semester) view.
//!
//! # Responsibility
//! - Hold at most one `GradeCell` per `(student_id, topic_id)`.
//! - Track which keys were edited since the last seed.
//! - Seed wholesale from persisted rows.
//!
//! # Invariants
//! - `seed` replaces all content and clears pending edits; it is idempotent.
//! - Writes through `set`/`set_score` clamp scores to the matrix scale.
//! - A cell with no score, no comment and no backing row is removed, so
//!   "absent" is never represented as an empty cell.

use crate::model::dimension::{StudentId, TopicId};
use crate::model::grade::{GradeCell, GradeKey, GradeRow};
use crate::model::scale::ScoreScale;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Borrowed view of one cell during enumeration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEntry<'a> {
    pub student_id: &'a StudentId,
    pub topic_id: &'a TopicId,
    pub cell: &'a GradeCell,
}

impl CellEntry<'_> {
    pub fn key(&self) -> GradeKey {
        GradeKey::new(self.student_id.clone(), self.topic_id.clone())
    }
}

/// Students × topics grid of editable cells.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeMatrix {
    scale: ScoreScale,
    cells: BTreeMap<StudentId, BTreeMap<TopicId, GradeCell>>,
    pending: BTreeSet<GradeKey>,
}

impl GradeMatrix {
    /// Creates an empty matrix bound to `scale`.
    pub fn new(scale: ScoreScale) -> Self {
        Self {
            scale,
            cells: BTreeMap::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Creates a matrix already seeded from `rows`.
    pub fn seeded(scale: ScoreScale, rows: &[GradeRow]) -> Self {
        let mut matrix = Self::new(scale);
        matrix.seed(rows);
        matrix
    }

    pub fn scale(&self) -> &ScoreScale {
        &self.scale
    }

    /// Replaces the whole matrix content with persisted rows.
    ///
    /// Scores are taken as stored. When storage holds more than one row for a
    /// key, the first one in input order wins.
    pub fn seed(&mut self, rows: &[GradeRow]) {
        self.cells.clear();
        self.pending.clear();

        let mut duplicates = 0usize;
        for row in rows {
            let by_topic = self.cells.entry(row.student_id.clone()).or_default();
            if by_topic.contains_key(&row.topic_id) {
                duplicates += 1;
                continue;
            }
            by_topic.insert(
                row.topic_id.clone(),
                GradeCell {
                    score: row.score,
                    comment: row.comment.clone().filter(|c| !c.trim().is_empty()),
                    persisted_id: Some(row.id.clone()),
                },
            );
        }

        if duplicates > 0 {
            warn!(
                "event=grade_seed module=matrix status=warn duplicate_rows={} rows={}",
                duplicates,
                rows.len()
            );
        }
    }

    pub fn get(&self, student_id: &str, topic_id: &str) -> Option<&GradeCell> {
        self.cells.get(student_id)?.get(topic_id)
    }

    /// Overwrites (or creates) both score and comment of one cell.
    pub fn set(
        &mut self,
        student_id: &str,
        topic_id: &str,
        score: Option<f64>,
        comment: Option<String>,
    ) {
        let score = score.map(|value| self.scale.clamp(value));
        let comment = comment.filter(|c| !c.is_empty());
        self.write(student_id, topic_id, |cell| {
            cell.score = score;
            cell.comment = comment;
        });
    }

    /// Overwrites the score of one cell, keeping its comment.
    pub fn set_score(&mut self, student_id: &str, topic_id: &str, score: Option<f64>) {
        let score = score.map(|value| self.scale.clamp(value));
        self.write(student_id, topic_id, |cell| cell.score = score);
    }

    /// Overwrites the comment of one cell, keeping its score.
    pub fn set_comment(&mut self, student_id: &str, topic_id: &str, comment: Option<String>) {
        let comment = comment.filter(|c| !c.is_empty());
        self.write(student_id, topic_id, |cell| cell.comment = comment);
    }

    fn write(&mut self, student_id: &str, topic_id: &str, apply: impl FnOnce(&mut GradeCell)) {
        let key = GradeKey::new(student_id, topic_id);
        let exists = self.get(student_id, topic_id).is_some();

        let mut cell = self
            .cells
            .get(student_id)
            .and_then(|by_topic| by_topic.get(topic_id))
            .cloned()
            .unwrap_or_default();
        apply(&mut cell);

        if !cell.has_content() && !cell.is_known() {
            if exists {
                self.remove(student_id, topic_id);
            }
            self.pending.remove(&key);
            return;
        }

        self.cells
            .entry(key.student_id.clone())
            .or_default()
            .insert(key.topic_id.clone(), cell);
        self.pending.insert(key);
    }

    fn remove(&mut self, student_id: &str, topic_id: &str) {
        if let Some(by_topic) = self.cells.get_mut(student_id) {
            by_topic.remove(topic_id);
            if by_topic.is_empty() {
                self.cells.remove(student_id);
            }
        }
    }

    /// Enumerates every cell in (student id, topic id) order.
    pub fn all_cells(&self) -> impl Iterator<Item = CellEntry<'_>> + '_ {
        self.cells.iter().flat_map(|(student_id, by_topic)| {
            by_topic.iter().map(move |(topic_id, cell)| CellEntry {
                student_id,
                topic_id,
                cell,
            })
        })
    }

    /// Enumerates cells edited since the last seed, in key order.
    pub fn pending_cells(&self) -> impl Iterator<Item = CellEntry<'_>> + '_ {
        self.pending.iter().filter_map(|key| {
            let (student_id, by_topic) = self.cells.get_key_value(&key.student_id)?;
            let (topic_id, cell) = by_topic.get_key_value(&key.topic_id)?;
            Some(CellEntry {
                student_id,
                topic_id,
                cell,
            })
        })
    }

    /// Cells of one student keyed by topic.
    pub fn cells_for_student(&self, student_id: &str) -> Option<&BTreeMap<TopicId, GradeCell>> {
        self.cells.get(student_id)
    }

    pub fn is_pending(&self, student_id: &str, topic_id: &str) -> bool {
        self.pending.contains(&GradeKey::new(student_id, topic_id))
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of cells currently present.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::GradeMatrix;
    use crate::model::grade::{GradeKey, GradeRow};
    use crate::model::scale::ScoreScale;

    fn row(id: &str, student: &str, topic: &str, score: Option<f64>) -> GradeRow {
        GradeRow {
            id: id.to_string(),
            student_id: student.to_string(),
            topic_id: topic.to_string(),
            score,
            comment: None,
        }
    }

    #[test]
    fn seed_is_idempotent() {
        let rows = vec![
            row("p1", "s1", "t1", Some(8.0)),
            row("p2", "s1", "t2", None),
            row("p3", "s2", "t1", Some(4.5)),
        ];
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.seed(&rows);
        let first = matrix.clone();
        matrix.seed(&rows);

        assert_eq!(matrix, first);
        assert_eq!(matrix.len(), 3);
        assert!(!matrix.has_pending_edits());
    }

    #[test]
    fn seed_discards_previous_content_and_pending_edits() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s9", "t9", Some(5.0));
        matrix.seed(&[row("p1", "s1", "t1", Some(8.0))]);

        assert!(matrix.get("s9", "t9").is_none());
        assert!(!matrix.has_pending_edits());
        assert_eq!(
            matrix.get("s1", "t1").unwrap().persisted_id.as_deref(),
            Some("p1")
        );
    }

    #[test]
    fn seed_keeps_first_row_for_duplicate_keys() {
        let matrix = GradeMatrix::seeded(
            ScoreScale::ten_point(),
            &[
                row("p1", "s1", "t1", Some(8.0)),
                row("p2", "s1", "t1", Some(2.0)),
            ],
        );
        let cell = matrix.get("s1", "t1").unwrap();
        assert_eq!(cell.persisted_id.as_deref(), Some("p1"));
        assert_eq!(cell.score, Some(8.0));
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn set_clamps_and_marks_pending() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set("s1", "t1", Some(14.0), Some("great".to_string()));

        let cell = matrix.get("s1", "t1").unwrap();
        assert_eq!(cell.score, Some(10.0));
        assert_eq!(cell.comment.as_deref(), Some("great"));
        assert!(matrix.is_pending("s1", "t1"));
    }

    #[test]
    fn clearing_a_new_cell_removes_it() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s1", "t1", Some(6.0));
        matrix.set_score("s1", "t1", None);

        assert!(matrix.get("s1", "t1").is_none());
        assert!(matrix.is_empty());
        assert!(!matrix.has_pending_edits());
    }

    #[test]
    fn clearing_a_known_cell_keeps_the_backing_id() {
        let mut matrix =
            GradeMatrix::seeded(ScoreScale::ten_point(), &[row("p1", "s1", "t1", Some(7.0))]);
        matrix.set_score("s1", "t1", None);

        let cell = matrix.get("s1", "t1").unwrap();
        assert_eq!(cell.score, None);
        assert_eq!(cell.persisted_id.as_deref(), Some("p1"));
    }

    #[test]
    fn comment_edit_keeps_score() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s1", "t1", Some(6.0));
        matrix.set_comment("s1", "t1", Some("retake".to_string()));

        let cell = matrix.get("s1", "t1").unwrap();
        assert_eq!(cell.score, Some(6.0));
        assert_eq!(cell.comment.as_deref(), Some("retake"));
    }

    #[test]
    fn enumeration_is_ordered_and_restartable() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s2", "t1", Some(3.0));
        matrix.set_score("s1", "t2", Some(4.0));
        matrix.set_score("s1", "t1", Some(5.0));

        let keys: Vec<GradeKey> = matrix.all_cells().map(|entry| entry.key()).collect();
        assert_eq!(
            keys,
            vec![
                GradeKey::new("s1", "t1"),
                GradeKey::new("s1", "t2"),
                GradeKey::new("s2", "t1"),
            ]
        );
        assert_eq!(matrix.all_cells().count(), 3);
        assert_eq!(matrix.pending_cells().count(), 3);
    }
}
