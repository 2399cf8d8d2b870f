//! Grade editing use-case services.
//!
//! # Responsibility
//! - Orchestrate dimension loads, cell edits, statistics and saves.
//! - Keep presentation layers decoupled from storage details.

pub mod cell_editor;
pub mod grade_session;
pub mod stats;
