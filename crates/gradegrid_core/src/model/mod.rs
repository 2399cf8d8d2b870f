//! Domain model for grade matrices.
//!
//! # Responsibility
//! - Define the dimension records (course, semester, topic, student) owned
//!   by external CRUD screens and consumed read-only here.
//! - Define the grade cell/row shapes exchanged with storage.
//! - Define the score scale used for clamping and severity bands.
//!
//! # Invariants
//! - Every identifier is an opaque string assigned by storage.
//! - A grade cell is identified by `GradeKey` (student, topic) within a course.

pub mod dimension;
pub mod grade;
pub mod scale;
