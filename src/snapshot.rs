use crate::config::{READ_BUFFER_SIZE, SNAPSHOT_VERSION};
use crate::error::StoreError;
use crate::models::{Author, Book};
use crate::store::MemoryStore;
use bincode::Options;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub author_count: usize,
    pub book_count: usize,
}

#[derive(Deserialize)]
struct SnapshotDe {
    metadata: SnapshotMetadata,
    authors: FxHashMap<String, Author>,
    books: FxHashMap<String, Book>,
}

/// Borrows the store maps so saving does not clone every entity.
#[derive(Serialize)]
struct SnapshotSer<'a> {
    metadata: SnapshotMetadata,
    authors: &'a FxHashMap<String, Author>,
    books: &'a FxHashMap<String, Book>,
}

/// Returns `Ok(None)` if no snapshot exists yet. A snapshot that cannot be
/// decoded or has another version is an error so it never gets overwritten
/// by an empty store.
pub fn load(path: &Path) -> Result<Option<MemoryStore>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let reader = BufReader::with_capacity(READ_BUFFER_SIZE, File::open(path)?);
    let options = bincode::options().with_limit(file_size.saturating_add(1024));

    let snapshot: SnapshotDe = options
        .deserialize_from(reader)
        .map_err(StoreError::Corrupt)?;

    if snapshot.metadata.version != SNAPSHOT_VERSION {
        return Err(StoreError::VersionMismatch {
            found: snapshot.metadata.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    info!(
        authors = snapshot.metadata.author_count,
        books = snapshot.metadata.book_count,
        "Store snapshot loaded"
    );

    Ok(Some(MemoryStore::from_maps(snapshot.authors, snapshot.books)))
}

/// Serializes the store by reference and writes atomically via rename.
pub fn save(store: &MemoryStore, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let (authors, books) = store.maps();
    let snapshot = SnapshotSer {
        metadata: SnapshotMetadata {
            version: SNAPSHOT_VERSION,
            author_count: authors.len(),
            book_count: books.len(),
        },
        authors,
        books,
    };

    let tmp_path = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    bincode::options().serialize_into(&mut writer, &snapshot)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp_path, path)?;

    info!(
        authors = authors.len(),
        books = books.len(),
        path = ?path,
        "Store snapshot saved"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entity;
    use crate::store::{AuthorLookup, Sink};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .upsert(Entity::Author(Author {
                id: "OL2A".to_string(),
                name: "Jane Doe".to_string(),
                personal_name: "Doe, Jane".to_string(),
            }))
            .unwrap();
        store
            .upsert(Entity::Book(Book {
                id: "OL1W".to_string(),
                name: "Foo".to_string(),
                published_date: NaiveDate::from_ymd_opt(2009, 12, 11),
                author_ids: vec!["OL2A".to_string()],
                author_names: vec!["Jane Doe".to_string()],
                ..Book::default()
            }))
            .unwrap();
        store
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("missing.store")).unwrap().is_none());
    }

    #[test]
    fn save_and_load_preserves_entities() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelf.store");

        save(&sample_store(), &path).unwrap();
        let loaded = load(&path).unwrap().unwrap();

        assert_eq!(loaded.author_count(), 1);
        assert_eq!(loaded.book_count(), 1);
        assert_eq!(loaded.get("OL2A").unwrap().unwrap().personal_name, "Doe, Jane");
        let book = loaded.book("OL1W").unwrap();
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(2009, 12, 11));
        assert_eq!(book.author_names, vec!["Jane Doe"]);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelf.store");
        save(&sample_store(), &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("shelf.store");
        save(&MemoryStore::new(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelf.store");
        fs::write(&path, b"not valid bincode data").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert_eq!(fs::read(&path).unwrap(), b"not valid bincode data");
    }

    #[test]
    fn other_version_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelf.store");
        let store = sample_store();
        let (authors, books) = store.maps();
        let snapshot = SnapshotSer {
            metadata: SnapshotMetadata {
                version: SNAPSHOT_VERSION + 1,
                author_count: authors.len(),
                book_count: books.len(),
            },
            authors,
            books,
        };
        fs::write(&path, bincode::options().serialize(&snapshot).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionMismatch { found, expected }
                if found == SNAPSHOT_VERSION + 1 && expected == SNAPSHOT_VERSION
        ));
    }
}
