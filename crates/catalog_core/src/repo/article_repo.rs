//! Article repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `articles` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `list_all` applies no ordering of its own; rows come back in storage
//!   order.
//! - Mutations on a missing id return `RepoError::NotFound`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::article::{Article, ArticleId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT id, title, price, image FROM articles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ArticleId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for article rows.
pub trait ArticleRepository {
    /// Returns every row in storage order.
    fn list_all(&self) -> RepoResult<Vec<Article>>;
    fn get(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Inserts a row and returns the id assigned by the database.
    fn insert(&self, title: &str, price: i64, image: &str) -> RepoResult<ArticleId>;
    /// Updates title and price; replaces the image filename only when given.
    fn update(&self, id: ArticleId, title: &str, price: i64, image: Option<&str>)
        -> RepoResult<()>;
    fn delete(&self, id: ArticleId) -> RepoResult<()>;
}

/// SQLite-backed article repository over an injected connection.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema does
    ///   not carry the `articles` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_article_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn list_all(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!("{ARTICLE_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();

        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        Ok(articles)
    }

    fn get(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_article_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, title: &str, price: i64, image: &str) -> RepoResult<ArticleId> {
        self.conn.execute(
            "INSERT INTO articles (title, price, image) VALUES (?1, ?2, ?3);",
            params![title, price, image],
        )?;
        Ok(ArticleId(self.conn.last_insert_rowid()))
    }

    fn update(
        &self,
        id: ArticleId,
        title: &str,
        price: i64,
        image: Option<&str>,
    ) -> RepoResult<()> {
        let changed = match image {
            Some(image) => self.conn.execute(
                "UPDATE articles SET title = ?1, price = ?2, image = ?3 WHERE id = ?4;",
                params![title, price, image, id.get()],
            )?,
            None => self.conn.execute(
                "UPDATE articles SET title = ?1, price = ?2 WHERE id = ?3;",
                params![title, price, id.get()],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, id: ArticleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM articles WHERE id = ?1;", [id.get()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let id = ArticleId(row.get("id")?);

    let price: i64 = row.get("price")?;
    if price < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative price `{price}` in articles.price for id {id}"
        )));
    }

    let image: String = row.get("image")?;
    if image.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty image filename in articles.image for id {id}"
        )));
    }

    Ok(Article {
        id,
        title: row.get("title")?,
        price,
        image,
    })
}

fn ensure_article_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "articles")? {
        return Err(RepoError::MissingRequiredTable("articles"));
    }

    for column in ["id", "title", "price", "image"] {
        if !table_has_column(conn, "articles", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "articles",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
