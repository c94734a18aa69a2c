//! # Formix Common Library
//!
//! Shared code for the Formix analytics services including:
//! - Form, field and answer domain types
//! - Database bootstrap and persisted row models
//! - Bootstrap configuration loading
//! - Opaque identifier codec
//! - Calendar-day helpers

pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
pub use forms::{FieldKind, Form};
pub use ids::{IdentifierCodec, UuidIdCodec};
