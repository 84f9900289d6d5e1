//! Image file storage for article uploads.
//!
//! # Responsibility
//! - Persist uploaded image bytes under one root directory.
//! - Remove image files when their article goes away or is re-imaged.
//!
//! # Invariants
//! - Stored filenames are sanitized base names; they never contain path
//!   separators or `..`.
//! - `save` never overwrites an existing file. A colliding name gets a random
//!   suffix, so each article row owns a distinct file.
//! - No rollback on crash: a partially written file may remain.

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

static UNSAFE_FILENAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid filename regex"));

const COLLISION_SUFFIX_LEN: usize = 8;
const MAX_COLLISION_ATTEMPTS: usize = 16;

pub type ImageStoreResult<T> = Result<T, ImageStoreError>;

#[derive(Debug)]
pub enum ImageStoreError {
    /// Filename is empty after sanitizing, or escapes the storage root.
    InvalidFilename(String),
    /// No stored file with this name.
    NotFound(String),
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl Display for ImageStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFilename(name) => write!(f, "invalid image filename: `{name}`"),
            Self::NotFound(name) => write!(f, "image file not found: {name}"),
            Self::Io { op, path, source } => {
                write!(f, "image store {op} failed for `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ImageStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// File lifecycle contract used by the upload workflow.
pub trait ImageStore {
    /// Writes `bytes` under a sanitized form of `desired_filename` and returns
    /// the name actually used.
    fn save(&self, bytes: &[u8], desired_filename: &str) -> ImageStoreResult<String>;
    /// Removes one stored file. Missing files are reported as `NotFound`.
    fn delete(&self, filename: &str) -> ImageStoreResult<()>;
    /// Resolves a stored filename to its location on disk.
    fn path_of(&self, filename: &str) -> ImageStoreResult<PathBuf>;
    /// Returns whether a stored file with this name exists.
    fn contains(&self, filename: &str) -> bool {
        self.path_of(filename)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }
}

/// Filesystem-backed image store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// The root directory is created lazily on first `save`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ensure_root(&self) -> ImageStoreResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|source| ImageStoreError::Io {
            op: "create_dir",
            path: self.root.clone(),
            source,
        })
    }

    /// Creates the target file exclusively, retrying with a suffixed name on
    /// collision.
    fn create_unique(&self, base_name: &str) -> ImageStoreResult<(String, std::fs::File)> {
        let mut candidate = base_name.to_string();
        for _ in 0..MAX_COLLISION_ATTEMPTS {
            let path = self.root.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((candidate, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(
                        "event=image_save module=storage status=collision filename={candidate}"
                    );
                    candidate = with_collision_suffix(base_name);
                }
                Err(source) => {
                    return Err(ImageStoreError::Io {
                        op: "create",
                        path,
                        source,
                    })
                }
            }
        }

        Err(ImageStoreError::Io {
            op: "create",
            path: self.root.join(base_name),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free filename after repeated collisions",
            ),
        })
    }
}

impl ImageStore for FsImageStore {
    fn save(&self, bytes: &[u8], desired_filename: &str) -> ImageStoreResult<String> {
        let started_at = Instant::now();
        let base_name = sanitize_filename(desired_filename)
            .ok_or_else(|| ImageStoreError::InvalidFilename(desired_filename.to_string()))?;

        self.ensure_root()?;
        let (stored_name, mut file) = self.create_unique(&base_name)?;
        let path = self.root.join(&stored_name);

        if let Err(source) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            error!(
                "event=image_save module=storage status=error filename={stored_name} error={source}"
            );
            drop(file);
            discard_partial(&path, &stored_name);
            return Err(ImageStoreError::Io {
                op: "write",
                path,
                source,
            });
        }

        info!(
            "event=image_save module=storage status=ok filename={stored_name} bytes={} duration_ms={}",
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(stored_name)
    }

    fn delete(&self, filename: &str) -> ImageStoreResult<()> {
        let path = self.path_of(filename)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("event=image_delete module=storage status=ok filename={filename}");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ImageStoreError::NotFound(filename.to_string()))
            }
            Err(source) => Err(ImageStoreError::Io {
                op: "delete",
                path,
                source,
            }),
        }
    }

    fn path_of(&self, filename: &str) -> ImageStoreResult<PathBuf> {
        if !is_plain_file_name(filename) {
            return Err(ImageStoreError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}

/// Reduces an uploaded filename to a safe base name.
///
/// Accented letters are decomposed (NFKD) to their ASCII base, directory
/// components and characters outside `[A-Za-z0-9_.-]` are removed,
/// whitespace runs become `_`, and leading/trailing `.`/`_` are trimmed.
/// Returns `None` when nothing usable is left, or when the stem is lost and
/// only the extension would remain.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|ch| if ch == '/' || ch == '\\' { ' ' } else { ch })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_FILENAME_CHARS_RE.replace_all(&joined, "");
    let trimmed = stripped.trim_matches(|ch| ch == '.' || ch == '_');

    if trimmed.is_empty() {
        return None;
    }
    // `画.png` would otherwise come out as the extensionless `png`.
    if filename.contains('.') && !trimmed.contains('.') {
        return None;
    }
    Some(trimmed.to_string())
}

/// Removes a half-written file. Returns `false` when it is left behind.
fn discard_partial(path: &Path, stored_name: &str) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            error!(
                "event=image_save module=storage status=orphaned filename={stored_name} error={err}"
            );
            false
        }
    }
}

fn with_collision_suffix(base_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let suffix = &token[..COLLISION_SUFFIX_LEN];
    match base_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}-{suffix}.{extension}"),
        None => format!("{base_name}-{suffix}"),
    }
}

fn is_plain_file_name(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::{discard_partial, is_plain_file_name, sanitize_filename, with_collision_suffix};

    #[test]
    fn sanitize_strips_directories_and_unsafe_characters() {
        assert_eq!(sanitize_filename("chair.png").as_deref(), Some("chair.png"));
        assert_eq!(
            sanitize_filename("../../etc/passwd.png").as_deref(),
            Some("etc_passwd.png")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\my photo.JPG").as_deref(),
            Some("C_Users_me_my_photo.JPG")
        );
        assert_eq!(
            sanitize_filename("silla (roja)!.gif").as_deref(),
            Some("silla_roja.gif")
        );
        assert_eq!(sanitize_filename("niño.png").as_deref(), Some("nino.png"));
        assert_eq!(sanitize_filename("café.jpg").as_deref(), Some("cafe.jpg"));
        assert_eq!(sanitize_filename("é.png").as_deref(), Some("e.png"));
        assert_eq!(sanitize_filename("ﬁle.gif").as_deref(), Some("file.gif"));
        assert_eq!(sanitize_filename(".hidden.png").as_deref(), Some("hidden.png"));
    }

    #[test]
    fn sanitize_returns_none_when_nothing_is_left() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("../.."), None);
        assert_eq!(sanitize_filename("画像"), None);
        assert_eq!(sanitize_filename("画像.png"), None);
        assert_eq!(sanitize_filename("../.png"), None);
    }

    #[test]
    fn collision_suffix_keeps_extension() {
        let renamed = with_collision_suffix("chair.png");
        assert!(renamed.starts_with("chair-"));
        assert!(renamed.ends_with(".png"));
        assert_eq!(renamed.len(), "chair-.png".len() + 8);

        let bare = with_collision_suffix("chair");
        assert!(bare.starts_with("chair-"));
        assert!(!bare.contains('.'));
    }

    #[test]
    fn plain_file_name_rejects_traversal() {
        assert!(is_plain_file_name("chair.png"));
        assert!(!is_plain_file_name("../chair.png"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a\\b.png"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn discard_partial_reports_files_it_cannot_remove() {
        let dir = tempfile::tempdir().unwrap();

        let partial = dir.path().join("chair.png");
        std::fs::write(&partial, b"half").unwrap();
        assert!(discard_partial(&partial, "chair.png"));
        assert!(!partial.exists());

        assert!(discard_partial(&partial, "chair.png"));

        // A directory cannot be removed with `remove_file`.
        let stuck = dir.path().join("stuck.png");
        std::fs::create_dir(&stuck).unwrap();
        assert!(!discard_partial(&stuck, "stuck.png"));
        assert!(stuck.exists());
    }
}
