//! Shelfload: Open Library dump normalization pipeline
//!
//! Reads the author and work dumps of a bibliographic export, where each line is
//! tab-separated metadata followed by a JSON payload, and loads them into a keyed
//! store as normalized [`models::Author`] and [`models::Book`] entities.
//!
//! # Pipeline
//!
//! 1. **Authors phase** -- Stream the authors dump, normalize, upsert by id
//! 2. **Books phase** -- Stream the works dump; each book's author ids are resolved
//!    to names against the authors stored so far (`"unknown"` when absent)
//!
//! Processing is sequential: one line is extracted, normalized and persisted before
//! the next is read, so memory stays bounded by a single record. A bad line is
//! logged and skipped; only I/O failures on the dump itself abort a run.
//!
//! # Key Modules
//!
//! - [`source`] -- Lazy line reader with transparent BZ2 decompression
//! - [`payload`] -- Locates and parses the JSON object in a dump line
//! - [`normalize`] -- Author and book field extraction, dates, author resolution
//! - [`store`] -- `AuthorLookup` / `Sink` traits and the in-memory keyed store
//! - [`snapshot`] -- Atomic bincode persistence of the store between runs
//! - [`ingest`] -- Two-phase run driver and per-phase reports
//! - [`stats`] -- Per-phase counters
//! - [`error`] -- Record-level and store error types
//! - [`config`] -- Constants for key prefixes, formats and limits
//!
//! # Example Usage
//!
//! ```bash
//! # Load both dumps into a fresh store
//! shelfload load --authors ol_dump_authors.txt --books ol_dump_works.txt.bz2 --store shelf.store
//!
//! # Look up a stored book
//! shelfload show --store shelf.store book OL1W
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod payload;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod store;
