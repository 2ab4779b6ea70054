mod statement;

pub use statement::{build_insert, InsertStatement};

use crate::error::LoadError;
use crate::metrics::{LoadReport, MetricsRecorder, OpLabel};
use rusqlite::{params_from_iter, Connection, Statement};
use std::time::Instant;
use tracing::{info, instrument};

/// Default rows per intermediate flush under `ChunkedBatch`.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// How row execution and transaction boundaries are arranged for one load.
/// Chosen once per load call and fixed for its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Execute each row immediately; the connection commits every statement.
    RowAutoCommit,
    /// Execute each row immediately inside one transaction, commit at the end.
    RowUnitCommit,
    /// Queue every row, run them as a single batch, then commit.
    SingleBatch,
    /// Queue rows, flush every `chunk_size` rows as one batch, commit once
    /// at the end.
    ChunkedBatch { chunk_size: usize },
}

impl LoadStrategy {
    /// Driver-managed commit per statement. True only for `RowAutoCommit`;
    /// every other strategy defers the commit to the end of the load.
    pub fn auto_commit(self) -> bool {
        matches!(self, LoadStrategy::RowAutoCommit)
    }

    pub fn name(self) -> &'static str {
        match self {
            LoadStrategy::RowAutoCommit => "row-auto-commit",
            LoadStrategy::RowUnitCommit => "row-unit-commit",
            LoadStrategy::SingleBatch => "single-batch",
            LoadStrategy::ChunkedBatch { .. } => "chunked-batch",
        }
    }

    /// Map a menu token to a strategy. Returns `None` for anything outside
    /// "1".."4"; the caller loops on that, the core never re-prompts.
    pub fn from_token(token: &str) -> Option<LoadStrategy> {
        match token.trim() {
            "1" => Some(LoadStrategy::RowAutoCommit),
            "2" => Some(LoadStrategy::RowUnitCommit),
            "3" => Some(LoadStrategy::SingleBatch),
            "4" => Some(LoadStrategy::ChunkedBatch {
                chunk_size: DEFAULT_CHUNK_SIZE,
            }),
            _ => None,
        }
    }
}

/// Drives one full load of a row sequence into the destination table under
/// a fixed strategy. Owns the connection exclusively for the duration of a
/// `load` call. Values are bound positionally as strings with no coercion;
/// the store applies column affinity, so error timing stays at execute time.
pub struct BulkLoader<'c> {
    conn: &'c Connection,
    strategy: LoadStrategy,
}

impl<'c> BulkLoader<'c> {
    pub fn new(conn: &'c Connection, strategy: LoadStrategy) -> Self {
        Self { conn, strategy }
    }

    /// Run one load to completion and summarize its per-call timings.
    ///
    /// The first failed execute aborts the whole load; nothing is retried,
    /// and any open transaction rolls back when dropped. An empty row
    /// sequence is valid and yields a zero-operation report.
    #[instrument(level = "info", skip(self, stmt, rows), fields(strategy = self.strategy.name()))]
    pub fn load<I>(&self, stmt: &InsertStatement, rows: I) -> Result<LoadReport, LoadError>
    where
        I: IntoIterator<Item = Result<Vec<String>, LoadError>>,
    {
        if let LoadStrategy::ChunkedBatch { chunk_size } = self.strategy {
            if chunk_size == 0 {
                return Err(LoadError::InvalidChunkSize);
            }
        }

        let start = Instant::now();
        let mut metrics = MetricsRecorder::new();
        let loaded = match self.strategy {
            LoadStrategy::RowAutoCommit => self.each_row(stmt, rows, &mut metrics, false)?,
            LoadStrategy::RowUnitCommit => self.each_row(stmt, rows, &mut metrics, true)?,
            LoadStrategy::SingleBatch => self.batched(stmt, rows, &mut metrics, usize::MAX)?,
            LoadStrategy::ChunkedBatch { chunk_size } => {
                self.batched(stmt, rows, &mut metrics, chunk_size)?
            }
        };

        let report = metrics.summarize();
        info!(
            rows = loaded,
            calls = report.total_calls(),
            in_db = ?report.total_elapsed(),
            elapsed = ?start.elapsed(),
            "load complete"
        );
        Ok(report)
    }

    /// Execute every row as its own statement. With `unit` the rows share
    /// one transaction committed at the end; without it the connection
    /// commits each execute on its own.
    fn each_row<I>(
        &self,
        stmt: &InsertStatement,
        rows: I,
        metrics: &mut MetricsRecorder,
        unit: bool,
    ) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = Result<Vec<String>, LoadError>>,
    {
        let tx = if unit {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        let mut prepared = self.conn.prepare(&stmt.sql)?;

        let mut count = 0usize;
        for row in rows {
            let row = row?;
            check_width(&row, stmt.width, count)?;
            metrics.time(OpLabel::RowInsert, || {
                prepared.execute(params_from_iter(row.iter()))
            })?;
            count += 1;
        }

        drop(prepared);
        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(count)
    }

    /// Queue rows and flush them in batches of `chunk_size` inside one
    /// transaction. `usize::MAX` collapses this to a single batch. The
    /// trailing partial chunk is flushed before the commit; when it is
    /// empty the call is skipped.
    fn batched<I>(
        &self,
        stmt: &InsertStatement,
        rows: I,
        metrics: &mut MetricsRecorder,
        chunk_size: usize,
    ) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = Result<Vec<String>, LoadError>>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut prepared = self.conn.prepare(&stmt.sql)?;

        let mut pending: Vec<Vec<String>> = Vec::new();
        let mut count = 0usize;
        for row in rows {
            let row = row?;
            check_width(&row, stmt.width, count)?;
            pending.push(row);
            count += 1;
            if pending.len() == chunk_size {
                flush(&mut prepared, &mut pending, metrics)?;
            }
        }
        if !pending.is_empty() {
            flush(&mut prepared, &mut pending, metrics)?;
        }

        drop(prepared);
        tx.commit()?;
        Ok(count)
    }
}

/// Run all queued rows as one timed batch-execute, then clear the queue.
fn flush(
    prepared: &mut Statement<'_>,
    pending: &mut Vec<Vec<String>>,
    metrics: &mut MetricsRecorder,
) -> Result<(), LoadError> {
    metrics.time(OpLabel::BatchExecute, || -> Result<(), rusqlite::Error> {
        for row in pending.iter() {
            prepared.execute(params_from_iter(row.iter()))?;
        }
        Ok(())
    })?;
    pending.clear();
    Ok(())
}

fn check_width(row: &[String], expected: usize, index: usize) -> Result<(), LoadError> {
    if row.len() != expected {
        return Err(LoadError::RowWidthMismatch {
            row: index + 1,
            expected,
            found: row.len(),
        });
    }
    Ok(())
}
