use anyhow::anyhow;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::OnceCell;

use crate::error::AppResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Journal storage. Construct once at the application root, call [`Store::init`]
/// before first use, and share by reference.
#[derive(Debug)]
pub struct Store {
    pool: SqlitePool,
    initialized: OnceCell<()>,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            initialized: OnceCell::new(),
        }
    }

    /// Applies the schema. Runs at most once per store; later calls return immediately.
    pub async fn init(&self) -> AppResult<()> {
        self.initialized
            .get_or_try_init(|| async {
                MIGRATOR.run(&self.pool).await?;
                tracing::info!("Database migrations applied");
                Ok::<(), crate::error::AppError>(())
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        self.ensure_initialized()?;
        Ok(self.pool.acquire().await?)
    }

    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        self.ensure_initialized()?;
        Ok(self.pool.begin().await?)
    }

    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    fn ensure_initialized(&self) -> AppResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(anyhow!("store used before init()").into())
        }
    }
}
