//! The warehouse façade and its transactional query executor.
//!
//! [`Warehouse`] owns the connection pool and the surrogate-key bank.
//! Every other component is a pure query producer; this module is the
//! only place a connection is ever held.

use std::collections::BTreeMap;

use futures::future::join_all;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use crate::config::MariadbSettings;
use crate::error::{Result, StoreError};
use crate::keys::KeyBank;
use crate::record::Run;
use crate::schema::{star_schema, SqlMap, Table};
use crate::sql;

/// Write-only star-schema warehouse over a pooled MariaDB connection.
#[derive(Debug)]
pub struct Warehouse {
    pool: MySqlPool,
    keys: KeyBank,
    column_store: bool,
}

impl Warehouse {
    /// Build the pool without touching the database. Used by the
    /// admin commands, which must work before any table exists.
    pub fn connect(settings: &MariadbSettings) -> Warehouse {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.conn_limit)
            .connect_lazy_with(options);
        Warehouse {
            pool,
            keys: KeyBank::new(),
            column_store: settings.column_store,
        }
    }

    /// Build the pool and seed the key bank from the current
    /// `MAX(<key>)` of every dimension. The ingestion path requires
    /// a seeded bank; use this for anything that inserts.
    pub async fn open(settings: &MariadbSettings) -> Result<Warehouse> {
        let warehouse = Warehouse::connect(settings);
        warehouse.seed_keys().await?;
        Ok(warehouse)
    }

    /// Read `MAX(<key>)` from every dimension and seed the bank, so
    /// freshly allocated ids continue after the existing rows.
    pub async fn seed_keys(&self) -> Result<()> {
        let statements = sql::lookup::key_seeds(star_schema())?;
        let seeds = self
            .run_map(statements, |_, rows| Ok(lookup_id(rows)))
            .await?;
        for (table, max) in seeds {
            let max = max.unwrap_or(0);
            tracing::debug!(table = table.name(), max, "seeding key bank");
            self.keys.set(table, max);
        }
        Ok(())
    }

    /// Create every warehouse table. Fails if any already exists.
    pub async fn init(&self) -> Result<()> {
        let statements = sql::ddl::create_tables(star_schema(), self.column_store);
        self.run_map(statements, |_, _| Ok(())).await?;
        tracing::info!("warehouse tables created");
        Ok(())
    }

    /// Drop every warehouse table. Destructive; the caller gates this
    /// behind an explicit operator flag.
    pub async fn drop_tables(&self) -> Result<()> {
        let statements = sql::ddl::drop_tables(star_schema());
        self.run_map(statements, |_, _| Ok(())).await?;
        tracing::info!("warehouse tables dropped");
        Ok(())
    }

    /// Ingest a batch of runs. Runs are processed concurrently; per
    /// run the lookup and insert phases are sequential. The first
    /// failure is propagated after every pipeline settles.
    pub async fn insert_runs(&self, runs: &[Run]) -> Result<()> {
        let results = join_all(runs.iter().map(|run| self.insert_run(run))).await;
        results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// One record pipeline: resolve existing dimension ids, then
    /// insert the missing dimensions and the fact row.
    async fn insert_run(&self, run: &Run) -> Result<()> {
        let lookups = sql::lookup::dimension_lookups(star_schema(), run)?;
        let found = self
            .run_map(lookups, |_, rows| Ok(lookup_id(rows)))
            .await?;
        let mut known: BTreeMap<Table, u64> = found
            .into_iter()
            .filter_map(|(table, id)| id.map(|id| (table, id)))
            .collect();

        let inserts = sql::insert::run_inserts(star_schema(), run, &self.keys, &mut known)?;
        tracing::debug!(
            dimensions = inserts.len() - 1,
            "inserting run for {}",
            run.url
        );
        self.run_map(inserts, |_, _| Ok(())).await?;
        Ok(())
    }

    /// Run a per-table statement map inside one transaction on one
    /// pooled connection, piping each result set through `mapper`.
    ///
    /// All statements succeed before the commit; on any failure the
    /// transaction is rolled back, the connection returns to the pool
    /// and the error propagates. The map shape guarantees at most one
    /// statement per table per call.
    async fn run_map<T, F>(&self, statements: SqlMap, mut mapper: F) -> Result<BTreeMap<Table, T>>
    where
        F: FnMut(Table, &[MySqlRow]) -> Result<T>,
    {
        let mut tx = self.pool.begin().await?;
        let mut results = BTreeMap::new();
        for (table, statement) in &statements {
            let rows = match sqlx::query(statement).fetch_all(&mut *tx).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(table = table.name(), error = %e, "statement failed, rolling back");
                    rollback(tx).await;
                    return Err(StoreError::Driver(e));
                }
            };
            match mapper(*table, &rows) {
                Ok(value) => {
                    results.insert(*table, value);
                }
                Err(e) => {
                    rollback(tx).await;
                    return Err(e);
                }
            }
        }
        tx.commit().await?;
        Ok(results)
    }
}

async fn rollback(tx: sqlx::Transaction<'_, sqlx::MySql>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "rollback failed");
    }
}

/// Parse a lookup result set into the dimension id, if any.
///
/// `MAX` over an empty table yields a NULL row; a row that fails to
/// decode is treated the same way ("dimension absent"), letting the
/// insert phase materialize the row instead of failing the record.
fn lookup_id(rows: &[MySqlRow]) -> Option<u64> {
    let row = rows.first()?;
    row.try_get::<Option<u64>, _>("id").ok().flatten()
}
