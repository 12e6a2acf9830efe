//! Repository for books, authors and their associations.
//!
//! They're tightly coupled: a book row is never written without its subject
//! and author join rows, and author rows only exist because some book
//! referenced them. Each book is therefore persisted in a single transaction.

use crate::authors::{AuthorCache, fold_name};
use crate::error::{ErrorKind, Result};
use crate::models::{AuthorRow, BookRow};
use crate::Database;
use exn::ResultExt;
use pgrdf_extract::models::BookRecord;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;
use tracing::instrument;

/// Upper bound on values bound to one batched `IN (...)` lookup.
///
/// SQLite builds before 3.32 refuse more than 999 host parameters per
/// statement; larger lookups are split into several queries.
pub const MAX_BIND_PARAMETERS: usize = 999;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub books: u64,
    pub authors: u64,
    pub book_authors: u64,
    pub book_subjects: u64,
}

/// Repository for managing book and author entries in the catalog database.
///
/// # Relationships
///
/// - A book has zero or more authors (`book_author`, one row per distinct
///   author) and zero or more subjects (`book_subject`, one row per subject).
/// - Authors are shared between books and deduplicated case-insensitively;
///   the first spelling encountered is the one that gets stored.
/// - Books are never updated. Nothing is deleted except by
///   [`clean_all`](Self::clean_all).
///
/// With `dry_run` set, every read still hits the database but writes are
/// skipped and reported as successful. A dry run's "stored" count is
/// therefore what a real run would store: those records are still missing
/// afterwards, and an incremental run stores every one of them again.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn sqlx_hates_u64(id: u64) -> Result<i64> {
        i64::try_from(id).or_raise(|| ErrorKind::InvalidData("book id"))
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete every row of every table, join tables first, in one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn clean_all(&self) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/clean_all.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Batched lookups
    // =========================================================================

    /// Which of the given catalog numbers already have a book row.
    ///
    /// One query per [`MAX_BIND_PARAMETERS`] ids, however many records are
    /// being checked.
    #[instrument(skip_all, fields(ids = ids.len()))]
    pub async fn existing_book_ids(&self, ids: &[u64]) -> Result<HashSet<u64>> {
        let mut existing = HashSet::new();
        for batch in ids.chunks(MAX_BIND_PARAMETERS) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM book WHERE id IN (");
            let mut separated = query.separated(", ");
            for &id in batch {
                separated.push_bind(Self::sqlx_hates_u64(id)?);
            }
            separated.push_unseparated(")");
            let found: Vec<i64> =
                query.build_query_scalar().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            for id in found {
                existing.insert(u64::try_from(id).or_raise(|| ErrorKind::InvalidData("book id"))?);
            }
        }
        Ok(existing)
    }

    /// Look up the ids of every name not already in `cache` and add the ones
    /// that exist to it. Names that don't exist yet are left for
    /// [`store_book`](Self::store_book) to create.
    ///
    /// Returns how many names were newly cached.
    #[instrument(skip_all, fields(cached = cache.len()))]
    pub async fn resolve_authors<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        cache: &mut AuthorCache,
    ) -> Result<usize> {
        let missing = cache.missing(names);
        let mut resolved = 0;
        for batch in missing.chunks(MAX_BIND_PARAMETERS) {
            let mut query: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT id, name_folded FROM author WHERE name_folded IN (");
            let mut separated = query.separated(", ");
            for folded in batch {
                separated.push_bind(folded.as_str());
            }
            separated.push_unseparated(")");
            let rows: Vec<AuthorRow> =
                query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            resolved += rows.len();
            for row in rows {
                cache.insert_folded(row.name_folded, row.id);
            }
        }
        tracing::debug!(requested = missing.len(), resolved, "resolved authors");
        Ok(resolved)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a book, its subjects and its author associations atomically.
    ///
    /// Authors missing from `cache` are created inside the same transaction;
    /// a name repeated within the record (in any case) is created and linked
    /// once. The new ids are added to `cache` only after the commit, so a
    /// failed record leaves the cache exactly as it was.
    ///
    /// Fails (with nothing written) if a book with the same id already exists.
    #[instrument(skip_all, fields(id = book.id, authors = book.authors.len(), subjects = book.subjects.len()))]
    pub async fn store_book(&self, book: &BookRecord, cache: &mut AuthorCache) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let row = BookRow::try_from(book)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_book.sql"))
            .bind(row.id)
            .bind(&row.title)
            .bind(&row.publisher)
            .bind(&row.published_at)
            .bind(&row.language)
            .bind(&row.license)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for subject in &book.subjects {
            sqlx::query(include_str!("../queries/insert_book_subject.sql"))
                .bind(row.id)
                .bind(subject)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }

        let mut created: Vec<(String, i64)> = Vec::new();
        let mut linked: Vec<i64> = Vec::with_capacity(book.authors.len());
        for name in &book.authors {
            let folded = fold_name(name);
            let known = cache
                .get_folded(&folded)
                .or_else(|| created.iter().find(|(f, _)| *f == folded).map(|&(_, id)| id));
            let author_id = match known {
                Some(id) => id,
                None => {
                    let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_author.sql"))
                        .bind(name)
                        .bind(&folded)
                        .fetch_one(&mut *tx)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                    created.push((folded, id));
                    id
                },
            };
            if linked.contains(&author_id) {
                continue;
            }
            sqlx::query(include_str!("../queries/insert_book_author.sql"))
                .bind(row.id)
                .bind(author_id)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            linked.push(author_id);
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        cache.extend(created);
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Reconstruct a stored record: authors in the order they were linked,
    /// subjects in insertion order and licenses split back apart.
    pub async fn get_book(&self, id: u64) -> Result<Option<BookRecord>> {
        let id = Self::sqlx_hates_u64(id)?;
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let authors: Vec<String> = sqlx::query_scalar(include_str!("../queries/get_book_authors.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let subjects: Vec<String> = sqlx::query_scalar(include_str!("../queries/get_book_subjects.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.into_record(authors, subjects).map(Some)
    }

    pub async fn counts(&self) -> Result<Counts> {
        let (books, authors, book_authors, book_subjects): (i64, i64, i64, i64) =
            sqlx::query_as(include_str!("../queries/counts.sql"))
                .fetch_one(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        let count = |n: i64| u64::try_from(n).or_raise(|| ErrorKind::InvalidData("row count"));
        Ok(Counts {
            books: count(books)?,
            authors: count(authors)?,
            book_authors: count(book_authors)?,
            book_subjects: count(book_subjects)?,
        })
    }
}
