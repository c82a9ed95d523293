use crate::error::StoreError;
use crate::models::{Author, Book, Entity};
use rustc_hash::FxHashMap;

/// Read side used by book normalization to resolve author names.
pub trait AuthorLookup {
    fn get(&self, id: &str) -> Result<Option<Author>, StoreError>;
}

/// Write side: insert-or-overwrite by id, no field merging.
pub trait Sink {
    fn upsert(&mut self, entity: Entity) -> Result<(), StoreError>;
}

/// Keyed in-memory store. Persisted between runs by [`crate::snapshot`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    authors: FxHashMap<String, Author>,
    books: FxHashMap<String, Book>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(authors: FxHashMap<String, Author>, books: FxHashMap<String, Book>) -> Self {
        Self { authors, books }
    }

    pub fn maps(&self) -> (&FxHashMap<String, Author>, &FxHashMap<String, Book>) {
        (&self.authors, &self.books)
    }

    pub fn author(&self, id: &str) -> Option<&Author> {
        self.authors.get(id)
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

impl AuthorLookup for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Author>, StoreError> {
        Ok(self.authors.get(id).cloned())
    }
}

impl Sink for MemoryStore {
    fn upsert(&mut self, entity: Entity) -> Result<(), StoreError> {
        match entity {
            Entity::Author(author) => {
                self.authors.insert(author.id.clone(), author);
            }
            Entity::Book(book) => {
                self.books.insert(book.id.clone(), book);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: &str, name: &str) -> Author {
        Author {
            id: id.to_string(),
            name: name.to_string(),
            personal_name: String::new(),
        }
    }

    #[test]
    fn get_missing_author_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("OL1A").unwrap(), None);
    }

    #[test]
    fn upsert_then_get() {
        let mut store = MemoryStore::new();
        store.upsert(Entity::Author(author("OL1A", "Jane Doe"))).unwrap();
        assert_eq!(store.get("OL1A").unwrap(), Some(author("OL1A", "Jane Doe")));
    }

    #[test]
    fn upsert_overwrites_without_merge() {
        let mut store = MemoryStore::new();
        let mut first = author("OL1A", "Jane Doe");
        first.personal_name = "Jane".to_string();
        store.upsert(Entity::Author(first)).unwrap();
        store.upsert(Entity::Author(author("OL1A", "J. Doe"))).unwrap();

        assert_eq!(store.author_count(), 1);
        let stored = store.author("OL1A").unwrap();
        assert_eq!(stored.name, "J. Doe");
        assert_eq!(stored.personal_name, "");
    }

    #[test]
    fn authors_and_books_have_separate_keyspaces() {
        let mut store = MemoryStore::new();
        store.upsert(Entity::Author(author("X", "Author X"))).unwrap();
        store
            .upsert(Entity::Book(Book {
                id: "X".to_string(),
                name: "Book X".to_string(),
                ..Book::default()
            }))
            .unwrap();

        assert_eq!(store.author_count(), 1);
        assert_eq!(store.book_count(), 1);
        assert_eq!(store.author("X").unwrap().name, "Author X");
        assert_eq!(store.book("X").unwrap().name, "Book X");
    }
}
