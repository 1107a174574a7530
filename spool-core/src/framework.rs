use sqlx::PgPool;

/// Runs read queries against the connection pool.
///
/// Each query is a small struct with a `kanau::processor::Processor` impl on
/// this type, kept next to the entity it returns.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
