//! Database access layer for formix-an
//!
//! Plain async functions over a `SqlitePool`, one module per table family.
//! `forms` and `submissions` are read-only views of CRUD-owned tables.

pub mod daily_analytics;
pub mod field_reports;
pub mod forms;
pub mod submissions;
