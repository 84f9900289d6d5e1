//! Form input validation for article uploads.
//!
//! # Responsibility
//! - Check title presence, price format, file selection and file extension.
//! - Stay free of I/O so the workflow can reject input before touching
//!   storage.
//!
//! # Invariants
//! - Prices are whole numbers: any non-digit character (including `.`) is
//!   rejected.
//! - Extension matching is case-insensitive and uses the text after the last
//!   `.` only.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Extensions accepted when no allow-list is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Maximum raw price length, checked before parsing.
pub const MAX_PRICE_LEN: usize = 10;

/// Rejection reasons for upload form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    NoFileSelected,
    InvalidPrice,
    DisallowedExtension,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "article title is empty"),
            Self::NoFileSelected => write!(f, "no image file was selected"),
            Self::InvalidPrice => write!(
                f,
                "price is not a whole number of at most {MAX_PRICE_LEN} digits"
            ),
            Self::DisallowedExtension => write!(f, "image file extension is not allowed"),
        }
    }
}

impl Error for ValidationError {}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

/// Parses a raw price field.
///
/// Rules:
/// - non-empty and ASCII digits only;
/// - at most [`MAX_PRICE_LEN`] characters;
/// - non-negative once parsed.
pub fn validate_price(raw: &str) -> Result<i64, ValidationError> {
    if raw.is_empty() || raw.len() > MAX_PRICE_LEN {
        return Err(ValidationError::InvalidPrice);
    }
    if !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidPrice);
    }

    let price = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidPrice)?;
    if price < 0 {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(price)
}

pub fn validate_file_selected(filename: &str) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::NoFileSelected);
    }
    Ok(())
}

/// Checks `filename` against an extension allow-list.
///
/// `allowed` entries are expected in lowercase without the leading dot.
pub fn validate_extension<S: AsRef<str>>(
    filename: &str,
    allowed: &[S],
) -> Result<(), ValidationError> {
    let extension = file_extension(filename).ok_or(ValidationError::DisallowedExtension)?;
    let extension = extension.to_ascii_lowercase();
    if allowed.iter().any(|entry| entry.as_ref() == extension) {
        Ok(())
    } else {
        Err(ValidationError::DisallowedExtension)
    }
}

/// Returns the text after the last `.`, or `None` when there is no dot.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, extension)| extension)
}
