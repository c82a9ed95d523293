use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub personal_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub description: String,
    pub published_date: Option<NaiveDate>,
    pub cover_ids: Vec<String>,
    pub author_ids: Vec<String>,
    /// Parallel to `author_ids`
    pub author_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Author(Author),
    Book(Book),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Author(a) => &a.id,
            Entity::Book(b) => &b.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Author(_) => EntityKind::Author,
            Entity::Book(_) => EntityKind::Book,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EntityKind {
    Author,
    Book,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Author => f.write_str("author"),
            EntityKind::Book => f.write_str("book"),
        }
    }
}
