use catalog_core::{FsImageStore, ImageStore, ImageStoreError};

#[test]
fn save_creates_missing_directory_and_writes_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("static").join("uploads");
    let store = FsImageStore::new(&root);
    assert!(!root.exists());

    let stored = store.save(b"png-bytes", "chair.png").unwrap();

    assert_eq!(stored, "chair.png");
    assert!(store.contains(&stored));
    let bytes = std::fs::read(store.path_of(&stored).unwrap()).unwrap();
    assert_eq!(bytes, b"png-bytes");
}

#[test]
fn save_sanitizes_directory_components() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());

    let stored = store.save(b"x", "../../outside/evil name.png").unwrap();

    assert_eq!(stored, "outside_evil_name.png");
    assert!(dir.path().join("outside_evil_name.png").is_file());
    assert!(!dir.path().parent().unwrap().join("outside").exists());
}

#[test]
fn save_rejects_names_with_nothing_usable() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());

    let err = store.save(b"x", "../..").unwrap_err();
    assert!(matches!(err, ImageStoreError::InvalidFilename(name) if name == "../.."));
}

#[test]
fn colliding_names_never_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());

    let first = store.save(b"first", "chair.png").unwrap();
    let second = store.save(b"second", "chair.png").unwrap();

    assert_eq!(first, "chair.png");
    assert_ne!(first, second);
    assert!(second.starts_with("chair-"));
    assert!(second.ends_with(".png"));
    assert_eq!(std::fs::read(store.path_of(&first).unwrap()).unwrap(), b"first");
    assert_eq!(std::fs::read(store.path_of(&second).unwrap()).unwrap(), b"second");
}

#[test]
fn delete_removes_file_and_reports_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path());
    let stored = store.save(b"x", "chair.png").unwrap();

    store.delete(&stored).unwrap();
    assert!(!store.contains(&stored));

    let err = store.delete(&stored).unwrap_err();
    assert!(matches!(err, ImageStoreError::NotFound(name) if name == "chair.png"));
}

#[test]
fn delete_and_path_of_refuse_to_leave_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("uploads");
    std::fs::create_dir_all(&root).unwrap();
    let outside = dir.path().join("keep.png");
    std::fs::write(&outside, b"keep").unwrap();
    let store = FsImageStore::new(&root);

    let err = store.delete("../keep.png").unwrap_err();
    assert!(matches!(err, ImageStoreError::InvalidFilename(_)));
    assert!(store.path_of("..").is_err());
    assert!(!store.contains("../keep.png"));
    assert!(outside.is_file());
}
