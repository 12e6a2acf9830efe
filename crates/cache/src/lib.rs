//! SQLite catalog database.
//!
//! This crate owns the relational side of the loader: the connection pool,
//! the embedded schema, and the [`Repository`] that reads and writes books,
//! authors and their associations.
//!
//! # Architecture
//! The database stores two entity types and two join tables:
//! - **Books**: one row per catalog entry, keyed by catalog number. Written
//!   once and never updated.
//! - **Authors**: contributor names, deduplicated case-insensitively. An
//!   [`AuthorCache`] keeps name → id lookups out of the per-record path.
//! - **book_author / book_subject**: pure join rows.

mod authors;
mod db;
pub mod error;
mod models;
mod repo;

pub use crate::authors::{AuthorCache, fold_name};
pub use crate::db::Database;
pub use crate::repo::{Counts, MAX_BIND_PARAMETERS, Repository};
