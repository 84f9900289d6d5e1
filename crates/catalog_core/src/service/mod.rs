//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, image storage and repository calls.
//! - Keep the boundary layer decoupled from storage details.

pub mod catalog_service;
