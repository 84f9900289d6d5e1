//! Image file storage.
//!
//! # Responsibility
//! - Own the lifecycle of uploaded image files.
//! - Keep filesystem details out of workflow orchestration.

pub mod image_store;
