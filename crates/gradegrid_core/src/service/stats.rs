//! Derived statistics computed on read.
//!
//! # Invariants
//! - Absent scores are excluded from every mean; they never count as zero.
//! - Display rounding never feeds back into stored scores.

use crate::matrix::GradeMatrix;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Sentinel rendered when no score is present.
pub const NO_DATA: &str = "—";

/// Mean of present scores, or the no-data sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Average {
    Value(f64),
    NoData,
}

impl Average {
    /// Mean of `scores`, or `NoData` when there are none.
    pub fn of(scores: impl IntoIterator<Item = f64>) -> Self {
        let (sum, count) = scores
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));
        if count == 0 {
            Self::NoData
        } else {
            Self::Value(sum / count as f64)
        }
    }

    /// Unrounded mean.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(*value),
            Self::NoData => None,
        }
    }

    /// Mean rounded half-up to one decimal for display.
    pub fn rounded(&self) -> Option<f64> {
        self.value().map(round_one_decimal)
    }
}

impl Display for Average {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.rounded() {
            Some(value) => write!(f, "{value:.1}"),
            None => f.write_str(NO_DATA),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    ((10.0 * value) + 0.5).floor() / 10.0
}

/// Mean of `student_id`'s present scores over `topic_ids`.
pub fn average_for<'a>(
    matrix: &GradeMatrix,
    student_id: &str,
    topic_ids: impl IntoIterator<Item = &'a str>,
) -> Average {
    let Some(cells) = matrix.cells_for_student(student_id) else {
        return Average::NoData;
    };
    Average::of(
        topic_ids
            .into_iter()
            .filter_map(|topic_id| cells.get(topic_id).and_then(|cell| cell.score)),
    )
}

/// Mean of present scores in one topic column over `student_ids`.
pub fn topic_average<'a>(
    matrix: &GradeMatrix,
    topic_id: &str,
    student_ids: impl IntoIterator<Item = &'a str>,
) -> Average {
    Average::of(
        student_ids
            .into_iter()
            .filter_map(|student_id| matrix.get(student_id, topic_id).and_then(|cell| cell.score)),
    )
}

#[cfg(test)]
mod tests {
    use super::{average_for, topic_average, Average};
    use crate::matrix::GradeMatrix;
    use crate::model::scale::ScoreScale;

    #[test]
    fn average_excludes_absent_scores() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s1", "t1", Some(8.0));
        matrix.set_comment("s1", "t2", Some("missed".to_string()));
        matrix.set_score("s1", "t3", Some(6.0));

        let average = average_for(&matrix, "s1", ["t1", "t2", "t3"]);
        assert_eq!(average, Average::Value(7.0));
        assert_eq!(average.to_string(), "7.0");
    }

    #[test]
    fn average_ignores_topics_outside_the_loaded_set() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s1", "t1", Some(9.0));
        matrix.set_score("s1", "old", Some(2.0));

        assert_eq!(average_for(&matrix, "s1", ["t1"]), Average::Value(9.0));
    }

    #[test]
    fn no_scores_yield_sentinel_not_zero() {
        let matrix = GradeMatrix::new(ScoreScale::ten_point());
        let average = average_for(&matrix, "s1", ["t1", "t2"]);
        assert_eq!(average, Average::NoData);
        assert_eq!(average.to_string(), "—");
        assert_eq!(average.value(), None);
    }

    #[test]
    fn display_rounds_but_value_does_not() {
        let mut matrix = GradeMatrix::new(ScoreScale::ten_point());
        matrix.set_score("s1", "t1", Some(7.0));
        matrix.set_score("s1", "t2", Some(8.0));
        matrix.set_score("s1", "t3", Some(8.0));

        let average = average_for(&matrix, "s1", ["t1", "t2", "t3"]);
        assert!((average.value().unwrap() - 23.0 / 3.0).abs() < 1e-12);
        assert_eq!(average.rounded(), Some(7.7));
        assert_eq!(average.to_string(), "7.7");
        assert_eq!(matrix.get("s1", "t1").unwrap().score, Some(7.0));
    }

    #[test]
    fn average_of_plain_scores() {
        assert_eq!(Average::of([4.0, 6.0, 8.0]), Average::Value(6.0));
        assert_eq!(Average::of(std::iter::empty()), Average::NoData);
    }

    #[test]
    fn topic_average_spans_students() {
        let mut matrix = GradeMatrix::new(ScoreScale::percent());
        matrix.set_score("s1", "t1", Some(80.0));
        matrix.set_score("s2", "t1", Some(60.0));

        assert_eq!(
            topic_average(&matrix, "t1", ["s1", "s2", "s3"]),
            Average::Value(70.0)
        );
    }
}
