//! Asynchronous SQLite trade journal.
//!
//! `record` only enqueues. A single worker task drains the queue in batches
//! and writes each batch in one transaction on a blocking thread, so the
//! engine never waits on disk. `flush` is answered by the worker once every
//! record queued before it has been written.

use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::connection::{create_pool, run_migrations, DbPool};
use super::model::{NewTradeRow, TradeRow};
use super::schema::trades;
use crate::domain::journal::TradeRecord;
use crate::error::{Error, Result};
use crate::port::TradeRecorder;

enum Command {
    Record(TradeRecord),
    Flush(oneshot::Sender<()>),
}

pub struct SqliteJournal {
    pool: DbPool,
    sender: mpsc::UnboundedSender<Command>,
}

impl SqliteJournal {
    /// Open (creating if needed) the database at `path`, migrate it and
    /// start the writer. Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created or migrations fail.
    pub fn open(path: &str) -> Result<Self> {
        let pool = create_pool(path)?;
        run_migrations(&pool)?;
        info!(database = %path, "Trade journal opened");
        Ok(Self::with_pool(pool))
    }

    /// Start the writer on an already-migrated pool.
    #[must_use]
    pub fn with_pool(pool: DbPool) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(journal_worker(pool.clone(), receiver));
        Self { pool, sender }
    }

    /// Most recent records, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row does not parse.
    pub fn recent(&self, limit: i64) -> Result<Vec<TradeRecord>> {
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        let rows: Vec<TradeRow> = trades::table
            .select(TradeRow::as_select())
            .order(trades::id.desc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(TradeRow::into_record).collect()
    }
}

#[async_trait]
impl TradeRecorder for SqliteJournal {
    fn record(&self, record: TradeRecord) {
        if self.sender.send(Command::Record(record)).is_err() {
            warn!("Journal writer stopped, record dropped");
        }
    }

    async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Command::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }
}

async fn journal_worker(pool: DbPool, mut receiver: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = receiver.recv().await {
        let mut batch = Vec::new();
        let mut acks = Vec::new();
        match command {
            Command::Record(record) => batch.push(record),
            Command::Flush(ack) => acks.push(ack),
        }
        // Take whatever else is already queued, stopping at the first flush
        // so it is answered before anything queued after it.
        if acks.is_empty() {
            while let Ok(command) = receiver.try_recv() {
                match command {
                    Command::Record(record) => batch.push(record),
                    Command::Flush(ack) => {
                        acks.push(ack);
                        break;
                    }
                }
            }
        }

        if !batch.is_empty() {
            write_batch(pool.clone(), batch).await;
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
    debug!("Journal writer stopped");
}

async fn write_batch(pool: DbPool, batch: Vec<TradeRecord>) {
    let count = batch.len();
    let result = tokio::task::spawn_blocking(move || insert_rows(&pool, &batch)).await;
    match result {
        Ok(Ok(())) => debug!(count, "Journal batch written"),
        Ok(Err(e)) => warn!(error = %e, count, "Journal write failed"),
        Err(e) => warn!(error = %e, count, "Journal write task failed"),
    }
}

fn insert_rows(pool: &DbPool, batch: &[TradeRecord]) -> Result<()> {
    let rows: Vec<NewTradeRow> = batch.iter().map(NewTradeRow::from).collect();
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.transaction(|conn| {
        diesel::insert_into(trades::table)
            .values(&rows)
            .execute(conn)
            .map(|_| ())
    })
    .map_err(|e: diesel::result::Error| Error::Database(e.to_string()))
}
