//! Serialized write access to SQLite.
//!
//! SQLite allows one writer at a time; rather than letting pool connections
//! fight over the write lock, every mutation in this crate flows through a
//! single actor task that owns one connection and runs each job inside an
//! immediate transaction. Readers keep using the pool directly.

use super::DbPool;
use crate::errors::StorageError;
use diesel::connection::Connection;
use diesel::SqliteConnection;
use gapfill_core::errors::{Error, Result};
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

// A write job: runs against the actor's connection. Jobs answer with
// StorageError so Diesel errors flow out with `?`; the actor converts to the
// core error at the boundary, preserving variants like unique violations.
// The Box<dyn Any> erases the job's return type across the channel.
type Job = Box<
    dyn FnOnce(
            &mut SqliteConnection,
        ) -> std::result::Result<Box<dyn Any + Send + 'static>, StorageError>
        + Send
        + 'static,
>;

/// Handle for sending jobs to the writer actor. Cheap to clone.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job, oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>)>,
}

impl WriteHandle {
    /// Executes `job` on the writer's dedicated connection, inside an
    /// immediate transaction, and returns its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, StorageError>
            + Send
            + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .expect("writer actor's receiving channel closed; the actor stopped");

        ret_rx
            .await
            .expect("writer actor dropped the reply sender without answering")
            .map(|boxed: Box<dyn Any + Send + 'static>| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("writer actor result had the wrong type"))
            })
    }
}

/// Spawns the single-writer actor and returns its handle.
///
/// The actor claims one connection from `pool` for its whole lifetime and
/// terminates once every `WriteHandle` clone is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) =
        mpsc::channel::<(Job, oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>)>(1024);

    tokio::spawn(async move {
        let mut conn = pool
            .get()
            .expect("failed to claim a connection for the writer actor");

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c))
                .map_err(Error::from);

            // The caller may have given up waiting; that is fine.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
