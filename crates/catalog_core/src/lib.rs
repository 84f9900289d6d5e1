//! Core domain logic for the catalog manager.
//!
//! Articles (title, price, image) live in one SQLite table; their images live
//! in one directory. This crate owns the workflow that keeps both in step.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;
pub mod validate;

pub use config::{CatalogConfig, ConfigError, DbLocation, Messages};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleId};
pub use repo::article_repo::{ArticleRepository, RepoError, RepoResult, SqliteArticleRepository};
pub use service::catalog_service::{
    CatalogService, CreateArticleRequest, DeleteOutcome, DeletePrompt, UpdateArticleRequest,
    UpdateOutcome, UploadStage, UploadedImage, WorkflowError, WorkflowResult,
};
pub use storage::image_store::{
    sanitize_filename, FsImageStore, ImageStore, ImageStoreError, ImageStoreResult,
};
pub use validate::{
    validate_extension, validate_file_selected, validate_price, validate_title, ValidationError,
    DEFAULT_ALLOWED_EXTENSIONS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
