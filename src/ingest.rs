use crate::config::{MAX_REPORTED_FAILURES, PROGRESS_INTERVAL};
use crate::error::{RecordError, StoreError};
use crate::models::{Author, Entity, EntityKind};
use crate::normalize::{normalize_author, normalize_book, DatePolicy};
use crate::payload::extract_payload;
use crate::source::{DumpReader, RawLine};
use crate::stats::PhaseStats;
use crate::store::{AuthorLookup, Sink};
use anyhow::Result;
use indicatif::ProgressBar;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub date_policy: DatePolicy,
    /// Stop after this many lines per dump
    pub limit: Option<u64>,
}

#[derive(Debug)]
pub struct RecordFailure {
    pub line: u64,
    pub error: RecordError,
}

#[derive(Debug)]
pub struct PhaseReport {
    pub kind: EntityKind,
    pub path: PathBuf,
    pub stats: PhaseStats,
    /// First [`MAX_REPORTED_FAILURES`] failures; `stats` counts all of them
    pub failures: Vec<RecordFailure>,
}

impl PhaseReport {
    fn new(kind: EntityKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            stats: PhaseStats::new(),
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub authors: Option<PhaseReport>,
    pub books: Option<PhaseReport>,
}

/// Two-phase load: the authors dump runs to completion before the books dump
/// starts, so book normalization can resolve every author stored in phase 1.
pub fn run_pipeline<S>(
    authors_path: Option<&Path>,
    books_path: Option<&Path>,
    store: &mut S,
    options: IngestOptions,
) -> Result<RunReport>
where
    S: AuthorLookup + Sink,
{
    let mut report = RunReport::default();

    if let Some(path) = authors_path {
        report.authors = Some(ingest_file(path, EntityKind::Author, store, options)?);
    }

    if let Some(path) = books_path {
        if report.authors.is_none() {
            info!("No authors dump given; resolving against previously stored authors");
        }
        report.books = Some(ingest_file(path, EntityKind::Book, store, options)?);
    }

    Ok(report)
}

pub fn ingest_file<S>(
    path: &Path,
    kind: EntityKind,
    store: &mut S,
    options: IngestOptions,
) -> Result<PhaseReport>
where
    S: AuthorLookup + Sink,
{
    let reader = DumpReader::open(path)?;
    info!(path = %path.display(), kind = %kind, "Loading dump");
    ingest_lines(reader, path, kind, store, options)
}

/// Drives one dump: extract, normalize, upsert, one line at a time.
/// Record failures are logged and collected; only read errors abort.
pub fn ingest_lines<I, S>(
    lines: I,
    path: &Path,
    kind: EntityKind,
    store: &mut S,
    options: IngestOptions,
) -> Result<PhaseReport>
where
    I: Iterator<Item = Result<RawLine>>,
    S: AuthorLookup + Sink,
{
    let mut report = PhaseReport::new(kind, path);
    let limit = options.limit.unwrap_or(u64::MAX);
    let pb = ProgressBar::new_spinner();

    for line in lines.take(usize::try_from(limit).unwrap_or(usize::MAX)) {
        let line = line?;
        report.stats.inc_lines();

        match process_line(&line, kind, store, options.date_policy) {
            Ok(unresolved) => {
                report.stats.inc_upserted();
                report.stats.add_unresolved_authors(unresolved);
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    line = line.number,
                    error = %error,
                    text = %line.preview(120),
                    "Skipping {} record",
                    kind
                );
                report.stats.record_skip(&error);
                if report.failures.len() < MAX_REPORTED_FAILURES {
                    report.failures.push(RecordFailure {
                        line: line.number,
                        error,
                    });
                }
            }
        }

        if report.stats.lines_read % PROGRESS_INTERVAL == 0 {
            pb.set_message(format!("{} {kind} lines", report.stats.lines_read));
            pb.tick();
        }
    }

    pb.finish_and_clear();

    info!(
        kind = %kind,
        lines = report.stats.lines_read,
        upserted = report.stats.upserted,
        skipped = report.stats.skipped,
        "Dump loaded"
    );

    Ok(report)
}

/// Returns the number of author references that did not resolve.
fn process_line<S>(
    line: &RawLine,
    kind: EntityKind,
    store: &mut S,
    date_policy: DatePolicy,
) -> Result<u64, RecordError>
where
    S: AuthorLookup + Sink,
{
    let obj = extract_payload(&line.bytes)?;
    let lookup = MissCounter::new(&*store);

    let entity = match kind {
        EntityKind::Author => Entity::Author(normalize_author(&obj)?),
        EntityKind::Book => Entity::Book(normalize_book(&obj, &lookup, date_policy)?),
    };
    let unresolved = lookup.misses();

    debug!(kind = %kind, id = entity.id(), line = line.number, "Upserting");
    store.upsert(entity)?;
    Ok(unresolved)
}

/// Counts lookups that came back empty.
struct MissCounter<'a, L: ?Sized> {
    inner: &'a L,
    misses: Cell<u64>,
}

impl<'a, L: AuthorLookup + ?Sized> MissCounter<'a, L> {
    fn new(inner: &'a L) -> Self {
        Self {
            inner,
            misses: Cell::new(0),
        }
    }

    fn misses(&self) -> u64 {
        self.misses.get()
    }
}

impl<L: AuthorLookup + ?Sized> AuthorLookup for MissCounter<'_, L> {
    fn get(&self, id: &str) -> Result<Option<Author>, StoreError> {
        let found = self.inner.get(id)?;
        if found.is_none() {
            self.misses.set(self.misses.get() + 1);
        }
        Ok(found)
    }
}
