mod common;

use common::{insert_grade, seed_course, stored_score, COURSE};
use gradegrid_core::db::migrations::latest_version;
use gradegrid_core::db::open_db_in_memory;
use gradegrid_core::{
    GradeRepository, GradeRowUpdate, NewGradeRow, RepoError, SqliteGradeRepository,
};
use rusqlite::Connection;

fn topics(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn new_row(student_id: &str, topic_id: &str, score: Option<f64>) -> NewGradeRow {
    NewGradeRow {
        student_id: student_id.to_string(),
        topic_id: topic_id.to_string(),
        course_id: COURSE.to_string(),
        score,
        comment: None,
    }
}

#[test]
fn list_filters_by_course_and_topics_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    insert_grade(&conn, "g-late", "S1", "T1", Some(7.0), None, 2_000);
    insert_grade(&conn, "g-early", "S2", "T2", None, Some("late hand-in"), 1_000);
    insert_grade(&conn, "g-other-semester", "S1", "T3", Some(4.0), None, 500);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let rows = repo.list_grade_rows(COURSE, &topics(&["T1", "T2"])).unwrap();

    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["g-early", "g-late"]);
    assert_eq!(rows[0].comment.as_deref(), Some("late hand-in"));
    assert_eq!(rows[0].score, None);
    assert_eq!(rows[1].score, Some(7.0));
}

#[test]
fn list_with_no_topics_is_empty() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    insert_grade(&conn, "g1", "S1", "T1", Some(7.0), None, 1_000);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    assert!(repo.list_grade_rows(COURSE, &[]).unwrap().is_empty());
}

#[test]
fn insert_returns_generated_ids() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let ids = repo
        .insert_grade_rows(&[new_row("S1", "T1", Some(9.0)), new_row("S2", "T1", None)])
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(stored_score(&conn, "S1", "T1"), Some(9.0));
    assert_eq!(repo.count_rows_for_key(COURSE, "S2", "T1").unwrap(), 1);
}

#[test]
fn insert_batch_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let result = repo.insert_grade_rows(&[
        new_row("S1", "T1", Some(9.0)),
        new_row("S1", "missing-topic", Some(3.0)),
    ]);

    assert!(matches!(result, Err(RepoError::Db(_))));
    assert_eq!(repo.count_rows_for_key(COURSE, "S1", "T1").unwrap(), 0);
}

#[test]
fn update_overwrites_score_and_comment() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    insert_grade(&conn, "g1", "S1", "T1", Some(4.0), Some("retake"), 1_000);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    repo.update_grade_rows(&[GradeRowUpdate {
        id: "g1".to_string(),
        score: Some(8.5),
        comment: None,
    }])
    .unwrap();

    let rows = repo.list_grade_rows(COURSE, &topics(&["T1"])).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, Some(8.5));
    assert_eq!(rows[0].comment, None);
}

#[test]
fn update_with_stale_id_rolls_back_batch() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    insert_grade(&conn, "g1", "S1", "T1", Some(4.0), None, 1_000);
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let err = repo
        .update_grade_rows(&[
            GradeRowUpdate {
                id: "g1".to_string(),
                score: Some(9.0),
                comment: None,
            },
            GradeRowUpdate {
                id: "gone".to_string(),
                score: Some(2.0),
                comment: None,
            },
        ])
        .unwrap_err();

    match err {
        RepoError::StaleRowIds(ids) => assert_eq!(ids, vec!["gone".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stored_score(&conn, "S1", "T1"), Some(4.0));
    assert_eq!(repo.count_rows_for_key(COURSE, "S1", "T1").unwrap(), 1);
}

#[test]
fn non_finite_score_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    seed_course(&conn);
    conn.execute_batch(
        "INSERT INTO grades (id, course_id, student_id, topic_id, score)
         VALUES ('g1', 'C1', 'S1', 'T1', 9e999);",
    )
    .unwrap();
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let result = repo.list_grade_rows(COURSE, &topics(&["T1"]));
    assert!(matches!(result, Err(RepoError::InvalidData(_))));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteGradeRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}
