//! Single-cell edit normalization.
//!
//! # Responsibility
//! - Turn raw score input into a clamped optional score.
//! - Turn raw comment input into a trimmed, length-capped optional comment.
//! - Apply both to a `GradeMatrix` without touching storage.
//!
//! # Invariants
//! - Malformed input is normalized, never reported as an error.
//! - Score and comment edits are independent of each other.

use crate::config::EngineConfig;
use crate::matrix::GradeMatrix;

/// Applies user edits to matrix cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEditor {
    comment_max_chars: usize,
}

impl CellEditor {
    pub fn new(comment_max_chars: usize) -> Self {
        Self { comment_max_chars }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.comment_max_chars)
    }

    /// Writes the normalized score of `raw_input` and returns it.
    ///
    /// `None` means the input was not a number; the cell's score becomes
    /// absent and a missing cell is not created.
    pub fn edit_cell(
        &self,
        matrix: &mut GradeMatrix,
        student_id: &str,
        topic_id: &str,
        raw_input: &str,
    ) -> Option<f64> {
        let score = matrix.scale().normalize_input(raw_input);
        matrix.set_score(student_id, topic_id, score);
        score
    }

    /// Writes the normalized comment of `raw_comment` and returns it.
    ///
    /// A non-empty comment creates the cell even when it has no score.
    pub fn edit_comment(
        &self,
        matrix: &mut GradeMatrix,
        student_id: &str,
        topic_id: &str,
        raw_comment: &str,
    ) -> Option<String> {
        let comment = self.normalize_comment(raw_comment);
        matrix.set_comment(student_id, topic_id, comment.clone());
        comment
    }

    /// Trims, drops empty text and truncates to the configured char count.
    pub fn normalize_comment(&self, raw_comment: &str) -> Option<String> {
        let trimmed = raw_comment.trim();
        if trimmed.is_empty() {
            return None;
        }
        let capped: String = trimmed.chars().take(self.comment_max_chars).collect();
        Some(capped.trim_end().to_string())
    }
}
