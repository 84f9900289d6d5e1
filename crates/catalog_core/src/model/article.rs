//! Article domain model.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never changes afterwards.
//! - `price` is a whole, non-negative amount.
//! - `image` is a stored filename relative to the image store root.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Database-assigned article identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl ArticleId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One catalog entry as persisted in the `articles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Whole currency units.
    pub price: i64,
    /// Stored image filename.
    pub image: String,
}
