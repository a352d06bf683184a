//! Postgres implementation of the repositories on top of diesel-async.

mod carts;
mod chats;
mod menu;
mod orders;
mod payments;
mod tables;
mod users;

use anyhow::Context;

use crate::{
    common::db::{DbConnection, DbPool},
    store::StoreResult,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<DbConnection<'_>> {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        Ok(conn)
    }
}
