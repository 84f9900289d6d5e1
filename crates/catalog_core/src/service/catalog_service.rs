//! Upload-and-persist workflow for catalog articles.
//!
//! # Responsibility
//! - Sequence validation, image storage and row persistence for create,
//!   update and delete.
//! - Keep rows and image files consistent: every row references one existing
//!   file and no file outlives its row.
//!
//! # Invariants
//! - Create runs all four validations before any I/O, in the order title,
//!   file selected, price, extension.
//! - The row insert/update is the last write of create/update. When it fails,
//!   the image saved for it is removed again.
//! - An old image is deleted only after the new one is saved and the row
//!   points at it.
//! - A missing image file during delete or image replacement is tolerated.
//! - Update does not re-run the create validators on title and price; the
//!   price only has to be a non-negative integer.
//! - Writes are serialized per service (`&mut self`) only. Separate
//!   processes working on the same id may interleave file and row steps.

use crate::model::article::{Article, ArticleId};
use crate::repo::article_repo::{ArticleRepository, RepoError};
use crate::storage::image_store::{ImageStore, ImageStoreError};
use crate::validate::{
    validate_extension, validate_file_selected, validate_price, validate_title, ValidationError,
};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Progress of one request. Failures carry the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Validated,
    ImagePersisted,
    RecordPersisted,
    /// Delete only: the image is gone, the row is not yet.
    ImageRemoved,
}

impl UploadStage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::ImagePersisted => "image_persisted",
            Self::RecordPersisted => "record_persisted",
            Self::ImageRemoved => "image_removed",
        }
    }
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a workflow request.
#[derive(Debug)]
pub enum WorkflowError {
    /// Form input failed validation; nothing was written.
    Validation(ValidationError),
    /// Update price is not a non-negative whole number.
    UnstorablePrice(String),
    Storage {
        stage: UploadStage,
        source: ImageStoreError,
    },
    Repo {
        stage: UploadStage,
        source: RepoError,
    },
}

impl WorkflowError {
    /// Returns the validation failure, if this is one.
    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            Self::Validation(err) => Some(*err),
            _ => None,
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnstorablePrice(raw) => write!(f, "price `{raw}` cannot be stored"),
            Self::Storage { stage, source } => {
                write!(f, "image storage failed after stage {stage}: {source}")
            }
            Self::Repo { stage, source } => {
                write!(f, "article storage failed after stage {stage}: {source}")
            }
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::UnstorablePrice(_) => None,
            Self::Storage { source, .. } => Some(source),
            Self::Repo { source, .. } => Some(source),
        }
    }
}

impl From<ValidationError> for WorkflowError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Uploaded file as received from a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Client-side filename; empty when no file was chosen.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArticleRequest {
    pub title: String,
    /// Raw form text, validated as a whole number.
    pub price: String,
    pub image: UploadedImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateArticleRequest {
    pub id: ArticleId,
    pub title: String,
    pub price: String,
    /// `None`, or a file with an empty name, keeps the current image.
    pub image: Option<UploadedImage>,
}

/// Read-only confirmation step shown before a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub id: ArticleId,
    pub confirm_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Article was already gone; nothing changed.
    AlreadyAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

/// Catalog workflow facade over an article repository and an image store.
pub struct CatalogService<R: ArticleRepository, S: ImageStore> {
    repo: R,
    images: S,
    allowed_extensions: Vec<String>,
    confirm_message: String,
}

impl<R: ArticleRepository, S: ImageStore> CatalogService<R, S> {
    /// `allowed_extensions` must be lowercase, without dots.
    pub fn new(
        repo: R,
        images: S,
        allowed_extensions: Vec<String>,
        confirm_message: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            images,
            allowed_extensions,
            confirm_message: confirm_message.into(),
        }
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Lists every article in storage order.
    pub fn list(&self) -> WorkflowResult<Vec<Article>> {
        self.repo.list_all().map_err(|source| WorkflowError::Repo {
            stage: UploadStage::Received,
            source,
        })
    }

    /// Creates one article from an upload form.
    ///
    /// # Contract
    /// - Validation failures return before any file or row is written.
    /// - On insert failure the saved image is removed before returning.
    pub fn create(&mut self, request: &CreateArticleRequest) -> WorkflowResult<ArticleId> {
        let price = self.validate_create(request).inspect_err(|err| {
            info!(
                "event=article_create module=service status=rejected stage={} reason={err:?}",
                UploadStage::Received
            );
        })?;

        let stored_name = self
            .images
            .save(&request.image.bytes, &request.image.filename)
            .map_err(|source| {
                error!(
                    "event=article_create module=service status=error stage={} error={source}",
                    UploadStage::Validated
                );
                WorkflowError::Storage {
                    stage: UploadStage::Validated,
                    source,
                }
            })?;

        let id = match self.repo.insert(&request.title, price, &stored_name) {
            Ok(id) => id,
            Err(source) => {
                error!(
                    "event=article_create module=service status=error stage={} filename={stored_name} error={source}",
                    UploadStage::ImagePersisted
                );
                self.discard_image(&stored_name);
                return Err(WorkflowError::Repo {
                    stage: UploadStage::ImagePersisted,
                    source,
                });
            }
        };

        info!(
            "event=article_create module=service status=ok stage={} article_id={id} filename={stored_name}",
            UploadStage::RecordPersisted
        );
        Ok(id)
    }

    /// Returns the confirmation prompt, or `None` when the article is absent.
    pub fn delete_prompt(&self, id: ArticleId) -> WorkflowResult<Option<DeletePrompt>> {
        Ok(self.fetch(id)?.map(|article| DeletePrompt {
            id: article.id,
            confirm_message: self.confirm_message.clone(),
        }))
    }

    /// Deletes the article's image file and then its row.
    ///
    /// Calling this for an id that no longer exists is a no-op.
    pub fn delete_execute(&mut self, id: ArticleId) -> WorkflowResult<DeleteOutcome> {
        let Some(article) = self.fetch(id)? else {
            info!("event=article_delete module=service status=noop article_id={id}");
            return Ok(DeleteOutcome::AlreadyAbsent);
        };

        self.remove_image_tolerant(&article.image, id, UploadStage::Received)?;

        match self.repo.delete(id) {
            Ok(()) => {}
            Err(RepoError::NotFound(_)) => {
                warn!("event=article_delete module=service status=noop article_id={id} reason=row_vanished");
                return Ok(DeleteOutcome::AlreadyAbsent);
            }
            Err(source) => {
                error!("event=article_delete module=service status=error article_id={id} error={source}");
                return Err(WorkflowError::Repo {
                    stage: UploadStage::ImageRemoved,
                    source,
                });
            }
        }

        info!(
            "event=article_delete module=service status=ok article_id={id} filename={}",
            article.image
        );
        Ok(DeleteOutcome::Deleted)
    }

    /// Returns the current article for an edit form, or `None` when absent.
    pub fn update_view(&self, id: ArticleId) -> WorkflowResult<Option<Article>> {
        self.fetch(id)
    }

    /// Updates title and price, replacing the image when a new file is given.
    ///
    /// # Contract
    /// - Absent article -> `UpdateOutcome::NotFound`, nothing written.
    /// - With a new file: save new -> update row -> delete old file.
    /// - Without a new file the stored image is not touched.
    pub fn update_execute(
        &mut self,
        request: &UpdateArticleRequest,
    ) -> WorkflowResult<UpdateOutcome> {
        let id = request.id;
        let Some(current) = self.fetch(id)? else {
            info!("event=article_update module=service status=not_found article_id={id}");
            return Ok(UpdateOutcome::NotFound);
        };

        let price = parse_stored_price(&request.price)?;

        let new_image = request
            .image
            .as_ref()
            .filter(|image| validate_file_selected(&image.filename).is_ok());

        let Some(new_image) = new_image else {
            self.repo
                .update(id, &request.title, price, None)
                .map_err(|source| update_repo_error(id, source))?;
            info!("event=article_update module=service status=ok article_id={id} image=kept");
            return Ok(UpdateOutcome::Updated);
        };

        let stored_name = self
            .images
            .save(&new_image.bytes, &new_image.filename)
            .map_err(|source| {
                error!("event=article_update module=service status=error article_id={id} error={source}");
                WorkflowError::Storage {
                    stage: UploadStage::Validated,
                    source,
                }
            })?;

        let updated = self
            .repo
            .update(id, &request.title, price, Some(stored_name.as_str()));
        if let Err(source) = updated {
            self.discard_image(&stored_name);
            if let RepoError::NotFound(_) = source {
                warn!("event=article_update module=service status=not_found article_id={id} reason=row_vanished");
                return Ok(UpdateOutcome::NotFound);
            }
            return Err(update_repo_error(id, source));
        }

        // The row already points at the new file; a leftover old file is
        // logged rather than failing the update.
        if current.image != stored_name {
            let removed =
                self.remove_image_tolerant(&current.image, id, UploadStage::RecordPersisted);
            if let Err(err) = removed {
                warn!(
                    "event=article_update module=service status=orphaned article_id={id} filename={} error={err}",
                    current.image
                );
            }
        }

        info!(
            "event=article_update module=service status=ok article_id={id} image=replaced filename={stored_name}"
        );
        Ok(UpdateOutcome::Updated)
    }

    fn validate_create(&self, request: &CreateArticleRequest) -> Result<i64, ValidationError> {
        validate_title(&request.title)?;
        validate_file_selected(&request.image.filename)?;
        let price = validate_price(&request.price)?;
        validate_extension(&request.image.filename, &self.allowed_extensions)?;
        Ok(price)
    }

    fn fetch(&self, id: ArticleId) -> WorkflowResult<Option<Article>> {
        self.repo.get(id).map_err(|source| WorkflowError::Repo {
            stage: UploadStage::Received,
            source,
        })
    }

    /// Deletes an image that may already be gone.
    fn remove_image_tolerant(
        &self,
        filename: &str,
        id: ArticleId,
        stage: UploadStage,
    ) -> WorkflowResult<()> {
        match self.images.delete(filename) {
            Ok(()) => Ok(()),
            Err(ImageStoreError::NotFound(_)) => {
                warn!(
                    "event=image_delete module=service status=missing article_id={id} filename={filename}"
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=image_delete module=service status=error article_id={id} filename={filename} error={source}"
                );
                Err(WorkflowError::Storage { stage, source })
            }
        }
    }

    /// Best-effort removal of an image whose row write failed.
    fn discard_image(&self, filename: &str) {
        if let Err(err) = self.images.delete(filename) {
            error!(
                "event=image_discard module=service status=error filename={filename} error={err}"
            );
        }
    }
}

/// Converts raw update input into a storable price.
///
/// Looser than `validate_price`: no digit-only or length rule, only what the
/// `articles.price` column can hold.
fn parse_stored_price(raw: &str) -> WorkflowResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(price) if price >= 0 => Ok(price),
        _ => Err(WorkflowError::UnstorablePrice(raw.to_string())),
    }
}

fn update_repo_error(id: ArticleId, source: RepoError) -> WorkflowError {
    error!("event=article_update module=service status=error article_id={id} error={source}");
    WorkflowError::Repo {
        stage: UploadStage::Validated,
        source,
    }
}
