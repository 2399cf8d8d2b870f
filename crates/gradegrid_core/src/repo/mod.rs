//! Storage collaborator contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the row-level operations the grade engine depends on.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repositories only accept connections with migrations fully applied.
//! - Grade writes are exposed as batches; no natural-key upsert is offered.

pub mod dimension_repo;
pub mod grade_repo;
pub mod store;
