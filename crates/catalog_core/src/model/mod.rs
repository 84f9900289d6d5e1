//! Catalog domain model.
//!
//! # Invariants
//! - Every article is identified by a database-assigned `ArticleId`.
//! - An article row always references exactly one stored image file.

pub mod article;
