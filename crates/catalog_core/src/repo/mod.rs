//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the row-level data access contract for articles.
//! - Isolate SQLite query details from workflow orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod article_repo;
