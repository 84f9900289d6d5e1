use catalog_core::db::migrations::latest_version;
use catalog_core::db::open_db_in_memory;
use catalog_core::{ArticleId, ArticleRepository, RepoError, SqliteArticleRepository};
use rusqlite::Connection;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let id = repo.insert("Chair", 50, "chair.png").unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "Chair");
    assert_eq!(loaded.price, 50);
    assert_eq!(loaded.image, "chair.png");
}

#[test]
fn get_missing_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    assert!(repo.get(ArticleId(42)).unwrap().is_none());
}

#[test]
fn insert_assigns_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let first = repo.insert("Chair", 50, "chair.png").unwrap();
    let second = repo.insert("Table", 120, "table.png").unwrap();
    assert_ne!(first, second);
}

#[test]
fn list_all_returns_every_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    assert!(repo.list_all().unwrap().is_empty());

    repo.insert("Chair", 50, "chair.png").unwrap();
    repo.insert("Table", 120, "table.png").unwrap();

    let mut titles: Vec<_> = repo
        .list_all()
        .unwrap()
        .into_iter()
        .map(|article| article.title)
        .collect();
    titles.sort();
    assert_eq!(titles, ["Chair", "Table"]);
}

#[test]
fn update_without_image_keeps_filename() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let id = repo.insert("Chair", 50, "chair.png").unwrap();

    repo.update(id, "Chair2", 60, None).unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.title, "Chair2");
    assert_eq!(loaded.price, 60);
    assert_eq!(loaded.image, "chair.png");
}

#[test]
fn update_with_image_replaces_filename() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let id = repo.insert("Chair", 50, "chair.png").unwrap();

    repo.update(id, "Chair", 50, Some("chair-blue.png")).unwrap();

    assert_eq!(repo.get(id).unwrap().unwrap().image, "chair-blue.png");
}

#[test]
fn update_and_delete_missing_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let missing = ArticleId(7);

    let update_err = repo.update(missing, "x", 1, None).unwrap_err();
    assert!(matches!(update_err, RepoError::NotFound(id) if id == missing));

    let delete_err = repo.delete(missing).unwrap_err();
    assert!(matches!(delete_err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn delete_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let id = repo.insert("Chair", 50, "chair.png").unwrap();

    repo.delete(id).unwrap();

    assert!(repo.get(id).unwrap().is_none());
    assert!(repo.list_all().unwrap().is_empty());
}

#[test]
fn read_rejects_invalid_persisted_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO articles (title, price, image) VALUES ('Broken', -1, 'x.png');",
        [],
    )
    .unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();

    let err = repo.list_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("negative price")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteArticleRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_articles_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteArticleRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("articles"))
    ));
}

#[test]
fn repository_rejects_connection_missing_image_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            price INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteArticleRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "articles",
            column: "image"
        })
    ));
}

#[test]
fn article_serializes_with_plain_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn).unwrap();
    let id = repo.insert("Chair", 50, "chair.png").unwrap();

    let article = repo.get(id).unwrap().unwrap();
    let json = serde_json::to_value(&article).unwrap();
    assert_eq!(json["id"], serde_json::json!(id.get()));
    assert_eq!(json["title"], "Chair");
    assert_eq!(json["price"], 50);
    assert_eq!(json["image"], "chair.png");
}
