use crate::error::{Error, ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use pgrdf_cache::{AuthorCache, Repository};
use pgrdf_extract::models::BookRecord;
use std::pin::pin;

/// Records pulled from the source per unit of work.
pub const CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Delete everything, then load every record.
    FullReload,
    /// Load only records whose id isn't stored yet. Stored books are never
    /// updated, and books whose document has since vanished are kept.
    Incremental,
}

/// Running totals for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Records pulled from the source.
    pub processed: u64,
    /// Records persisted (or that would have been, in a dry run).
    pub stored: u64,
    /// Records already present, incremental mode only.
    pub skipped: u64,
    /// Records that failed to read or extract.
    pub rejected: u64,
}

/// Progress events emitted by [`ingest`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Cleaned`](Self::Cleaned): exactly once, full reload only.
/// 3. Per chunk: zero or more [`Rejected`](Self::Rejected), then one
///    [`ChunkComplete`](Self::ChunkComplete).
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// A fatal error terminates the stream early as its last item, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum IngestEvent {
    Started(LoadMode),
    /// Every table has been emptied.
    Cleaned,
    /// A record could not be read or extracted and was left out.
    Rejected { id: u64, error: Error },
    ChunkComplete(Progress),
    Complete(Progress),
}

/// Streams [`IngestEvent`]s while loading `records` into `cache`.
///
/// Records are pulled lazily, [`CHUNK_SIZE`] at a time. Each chunk costs one
/// existence check (incremental mode), one author lookup for names the run
/// hasn't seen yet, and one transaction per surviving record; the author
/// cache is shared by every chunk of the run.
///
/// Per-record read or extraction failures are reported as
/// [`IngestEvent::Rejected`] without interrupting the chunk. Database
/// failures are fatal: [`ErrorKind::Cache`] for the clean and the batched
/// lookups, [`ErrorKind::Store`] with the book's id when persisting a record.
pub fn ingest<'a, S>(cache: &'a Repository, records: S, mode: LoadMode) -> impl Stream<Item = Result<IngestEvent>> + 'a
where
    S: Stream<Item = (Result<BookRecord>, u64)> + 'a,
{
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(IngestEvent::Started(mode));

        if mode == LoadMode::FullReload {
            if let Err(e) = cache.clean_all().await.or_raise(|| ErrorKind::Cache) {
                yield Err(e);
                return;
            }
            tracing::info!("removed all previously loaded books and authors");
            yield Ok(IngestEvent::Cleaned);
        }

        let mut authors = AuthorCache::new();
        let mut progress = Progress::default();
        let mut chunks = pin!(records.chunks(CHUNK_SIZE));
        while let Some(chunk) = chunks.next().await {
            let mut books = Vec::with_capacity(chunk.len());
            for (result, id) in chunk {
                progress.processed += 1;
                match result {
                    Ok(book) => books.push(book),
                    Err(error) => {
                        tracing::warn!(id, error = ?error, "rejected document");
                        progress.rejected += 1;
                        yield Ok(IngestEvent::Rejected { id, error });
                    },
                }
            }

            if mode == LoadMode::Incremental && !books.is_empty() {
                let ids: Vec<u64> = books.iter().map(|book| book.id).collect();
                let existing = match cache.existing_book_ids(&ids).await.or_raise(|| ErrorKind::Cache) {
                    Ok(existing) => existing,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                books.retain(|book| !existing.contains(&book.id));
                // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
                progress.skipped += u64::try_from(ids.len() - books.len()).unwrap_or(0);
            }

            let names = books.iter().flat_map(|book| book.authors.iter().map(String::as_str));
            if let Err(e) = cache.resolve_authors(names, &mut authors).await.or_raise(|| ErrorKind::Cache) {
                yield Err(e);
                return;
            }

            for book in &books {
                if let Err(e) = cache.store_book(book, &mut authors).await.or_raise(|| ErrorKind::Store(book.id)) {
                    yield Err(e);
                    return;
                }
                progress.stored += 1;
            }

            tracing::info!(
                processed = progress.processed,
                stored = progress.stored,
                skipped = progress.skipped,
                rejected = progress.rejected,
                "chunk complete"
            );
            yield Ok(IngestEvent::ChunkComplete(progress));
        }

        yield Ok(IngestEvent::Complete(progress));
    })
}

/// Empties the database, then loads every record.
pub async fn run_full_reload<S>(cache: &Repository, records: S) -> Result<Progress>
where
    S: Stream<Item = (Result<BookRecord>, u64)>,
{
    drain(ingest(cache, records, LoadMode::FullReload)).await
}

/// Loads every record not already in the database.
pub async fn run_incremental<S>(cache: &Repository, records: S) -> Result<Progress>
where
    S: Stream<Item = (Result<BookRecord>, u64)>,
{
    drain(ingest(cache, records, LoadMode::Incremental)).await
}

async fn drain(events: impl Stream<Item = Result<IngestEvent>>) -> Result<Progress> {
    let mut events = pin!(events);
    let mut progress = Progress::default();
    while let Some(event) = events.next().await {
        match event? {
            IngestEvent::ChunkComplete(latest) | IngestEvent::Complete(latest) => progress = latest,
            IngestEvent::Started(_) | IngestEvent::Cleaned | IngestEvent::Rejected { .. } => {},
        }
    }
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records;
    use pgrdf_cache::{Counts, Database};
    use pgrdf_source::SourceHandle;
    use pgrdf_source::backend::MockSource;
    use rstest::rstest;
    use std::sync::Arc;

    fn document(about: u64, title: &str, authors: &[&str]) -> String {
        let creators: String = authors
            .iter()
            .map(|name| format!("<dcterms:creator><pgterms:agent><pgterms:name>{name}</pgterms:name></pgterms:agent></dcterms:creator>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <rdf:RDF>
              <cc:Work rdf:about="">
                <cc:license rdf:resource="CC0"/>
                <cc:license rdf:resource="public-domain"/>
              </cc:Work>
              <pgterms:ebook rdf:about="ebooks/{about}">
                <dcterms:title>{title}</dcterms:title>
                {creators}
                <dcterms:subject>
                  <rdf:Description>
                    <dcam:memberOf rdf:resource="http://purl.org/dc/terms/LCC"/>
                    <rdf:value>Q</rdf:value>
                  </rdf:Description>
                </dcterms:subject>
              </pgterms:ebook>
            </rdf:RDF>"#
        )
    }

    async fn setup(documents: impl IntoIterator<Item = (u64, String)>) -> (Database, Arc<MockSource>, SourceHandle) {
        let db = Database::connect_in_memory().await.unwrap();
        let mock = Arc::new(MockSource::with_documents(documents));
        let source: SourceHandle = mock.clone();
        (db, mock, source)
    }

    async fn incremental(repo: &Repository, source: &SourceHandle) -> Result<Progress> {
        run_incremental(repo, records(source).await.unwrap()).await
    }

    async fn events(repo: &Repository, source: &SourceHandle, mode: LoadMode) -> Vec<Result<IngestEvent>> {
        ingest(repo, records(source).await.unwrap(), mode).collect().await
    }

    #[tokio::test]
    async fn test_incremental_is_idempotent() {
        let (db, _, source) = setup([
            (1, document(1, "One", &["Austen, Jane"])),
            (2, document(2, "Two", &["Brontë, Charlotte"])),
            (3, document(3, "Three", &[])),
        ])
        .await;
        let repo = Repository::from(&db);
        let first = incremental(&repo, &source).await.unwrap();
        assert_eq!(first, Progress { processed: 3, stored: 3, skipped: 0, rejected: 0 });
        let counts = repo.counts().await.unwrap();

        let second = incremental(&repo, &source).await.unwrap();
        assert_eq!(second, Progress { processed: 3, stored: 0, skipped: 3, rejected: 0 });
        assert_eq!(repo.counts().await.unwrap(), counts);
    }

    #[tokio::test]
    async fn test_new_documents_are_picked_up() {
        let (db, mock, source) = setup([(1, document(1, "One", &["Twain, Mark"]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        mock.insert(2, document(2, "Two", &["TWAIN, MARK"])).await;
        let progress = incremental(&repo, &source).await.unwrap();
        assert_eq!((progress.stored, progress.skipped), (1, 1));
        // Resolved through the batched lookup in a fresh run.
        assert_eq!(repo.counts().await.unwrap().authors, 1);
    }

    #[tokio::test]
    async fn test_authors_deduplicated_case_insensitively() {
        let (db, _, source) =
            setup([(1, document(1, "One", &["Mark Twain"])), (2, document(2, "Two", &["mark twain"]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        let counts = repo.counts().await.unwrap();
        assert_eq!(counts.authors, 1);
        assert_eq!(counts.book_authors, 2);
    }

    #[tokio::test]
    async fn test_repeated_author_within_one_record() {
        let (db, _, source) = setup([(1, document(1, "One", &["Doe, Jane", "DOE, JANE"]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        let counts = repo.counts().await.unwrap();
        assert_eq!((counts.authors, counts.book_authors), (1, 1));
    }

    #[tokio::test]
    async fn test_stored_record_matches_document() {
        let (db, _, source) = setup([(84, document(84, "Frankenstein", &["Shelley, Mary Wollstonecraft"]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        let book = repo.get_book(84).await.unwrap().unwrap();
        assert_eq!(book.title, "Frankenstein");
        assert_eq!(book.authors, vec!["Shelley, Mary Wollstonecraft"]);
        assert_eq!(book.subjects, vec!["SCIENCE"]);
        assert_eq!(book.license(), "CC0; public-domain");
    }

    #[tokio::test]
    async fn test_rejected_record_does_not_abort_chunk() {
        let (db, _, source) = setup([
            (1, document(1, "One", &[])),
            (2, "<rdf:RDF><pgterms:ebook rdf:about=\"ebooks/2\">".to_string()),
            (3, document(3, "Three", &[])),
        ])
        .await;
        let repo = Repository::from(&db);
        let events = events(&repo, &source, LoadMode::Incremental).await;
        let rejected: Vec<(u64, bool)> = events
            .iter()
            .filter_map(|event| match event {
                Ok(IngestEvent::Rejected { id, error }) => Some((*id, matches!(&**error, ErrorKind::Extract))),
                _ => None,
            })
            .collect();
        assert_eq!(rejected, vec![(2, true)]);
        let Some(Ok(IngestEvent::Complete(progress))) = events.last() else {
            panic!("stream did not complete");
        };
        assert_eq!(*progress, Progress { processed: 3, stored: 2, skipped: 0, rejected: 1 });
        assert_eq!(repo.get_book(2).await.unwrap(), None);
    }

    #[rstest]
    #[case::incremental(LoadMode::Incremental)]
    #[case::full_reload(LoadMode::FullReload)]
    #[tokio::test]
    async fn test_unstorable_catalog_number_is_rejected(#[case] mode: LoadMode) {
        let oversized = 9_223_372_036_854_775_808;
        let (db, _, source) =
            setup([(1, document(1, "One", &["Austen, Jane"])), (oversized, document(oversized, "Huge", &[]))]).await;
        let repo = Repository::from(&db);
        let events = events(&repo, &source, mode).await;
        let rejected: Vec<u64> = events
            .iter()
            .filter_map(|event| match event {
                Ok(IngestEvent::Rejected { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(rejected, vec![oversized]);
        let Some(Ok(IngestEvent::Complete(progress))) = events.last() else {
            panic!("stream did not complete");
        };
        assert_eq!(*progress, Progress { processed: 2, stored: 1, skipped: 0, rejected: 1 });
        assert_eq!(repo.get_book(1).await.unwrap().unwrap().title, "One");
    }

    #[tokio::test]
    async fn test_full_reload_replaces_everything() {
        let (db, mock, source) =
            setup([(1, document(1, "One", &["Gone, Author"])), (2, document(2, "Two", &["Kept, Author"]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        mock.remove(1).await;
        mock.insert(3, document(3, "Three", &["Kept, Author"])).await;

        let progress = run_full_reload(&repo, records(&source).await.unwrap()).await.unwrap();
        assert_eq!(progress, Progress { processed: 2, stored: 2, skipped: 0, rejected: 0 });
        assert_eq!(repo.get_book(1).await.unwrap(), None);
        let counts = repo.counts().await.unwrap();
        assert_eq!(counts, Counts { books: 2, authors: 1, book_authors: 2, book_subjects: 2 });
    }

    #[tokio::test]
    async fn test_vanished_documents_are_kept_incrementally() {
        let (db, mock, source) = setup([(1, document(1, "One", &[])), (2, document(2, "Two", &[]))]).await;
        let repo = Repository::from(&db);
        incremental(&repo, &source).await.unwrap();
        mock.remove(1).await;
        incremental(&repo, &source).await.unwrap();
        assert!(repo.get_book(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_is_fatal() {
        // Two documents claiming the same catalog number in the same chunk.
        let (db, _, source) = setup([
            (10, document(10, "Ten", &["A"])),
            (11, document(10, "Imposter", &["B"])),
            (12, document(12, "Twelve", &[])),
        ])
        .await;
        let repo = Repository::from(&db);
        let events = events(&repo, &source, LoadMode::Incremental).await;
        let Some(Err(err)) = events.last() else {
            panic!("stream did not fail");
        };
        assert!(matches!(&**err, ErrorKind::Store(10)));
        assert!(!events.iter().any(|event| matches!(event, Ok(IngestEvent::Complete(_)))));
        // Committed before the failure, and nothing after it.
        assert_eq!(repo.get_book(10).await.unwrap().unwrap().title, "Ten");
        assert_eq!(repo.get_book(12).await.unwrap(), None);

        // Re-running picks up where it stopped: both claims on 10 are skipped.
        let progress = incremental(&repo, &source).await.unwrap();
        assert_eq!((progress.stored, progress.skipped), (1, 2));
        assert!(repo.get_book(12).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_event_order() {
        let (db, _, source) = setup([(1, document(1, "One", &[]))]).await;
        let repo = Repository::from(&db);
        let events: Vec<IngestEvent> =
            events(&repo, &source, LoadMode::FullReload).await.into_iter().map(|e| e.unwrap()).collect();
        assert!(matches!(
            events.as_slice(),
            [
                IngestEvent::Started(LoadMode::FullReload),
                IngestEvent::Cleaned,
                IngestEvent::ChunkComplete(_),
                IngestEvent::Complete(_)
            ]
        ));
    }

    #[tokio::test]
    async fn test_empty_source() {
        let (db, _, source) = setup(Vec::new()).await;
        let repo = Repository::from(&db);
        let events: Vec<IngestEvent> =
            events(&repo, &source, LoadMode::Incremental).await.into_iter().map(|e| e.unwrap()).collect();
        assert!(matches!(
            events.as_slice(),
            [IngestEvent::Started(LoadMode::Incremental), IngestEvent::Complete(progress)] if *progress == Progress::default()
        ));
    }

    #[tokio::test]
    async fn test_records_are_processed_in_chunks() {
        let documents: Vec<(u64, String)> =
            (1..=CHUNK_SIZE as u64 + 1).map(|id| (id, document(id, "Title", &["Same, Author"]))).collect();
        let (db, _, source) = setup(documents).await;
        let repo = Repository::from(&db);
        let events = events(&repo, &source, LoadMode::Incremental).await;
        let chunks: Vec<Progress> = events
            .iter()
            .filter_map(|event| match event {
                Ok(IngestEvent::ChunkComplete(progress)) => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].processed, CHUNK_SIZE as u64);
        assert_eq!(chunks[1].stored, CHUNK_SIZE as u64 + 1);
        assert_eq!(repo.counts().await.unwrap().authors, 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (db, _, source) = setup([(1, document(1, "One", &["A"])), (2, document(2, "Two", &["B"]))]).await;
        let repo = Repository::new(db.pool().clone(), true);
        let progress = run_full_reload(&repo, records(&source).await.unwrap()).await.unwrap();
        assert_eq!(progress.stored, 2);
        assert_eq!(repo.counts().await.unwrap(), Counts::default());
    }

    #[tokio::test]
    async fn test_dry_run_count_matches_the_real_run() {
        let (db, _, source) = setup([(1, document(1, "One", &["A"])), (2, document(2, "Two", &["B"]))]).await;
        let dry = Repository::new(db.pool().clone(), true);
        let rehearsal = incremental(&dry, &source).await.unwrap();
        assert_eq!((rehearsal.stored, rehearsal.skipped), (2, 0));
        // Nothing was written, so the real run finds the same records missing.
        let real = incremental(&Repository::from(&db), &source).await.unwrap();
        assert_eq!(real, rehearsal);
        assert_eq!(dry.counts().await.unwrap().books, 2);
    }
}
