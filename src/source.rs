use crate::backend::Backend;
use crate::codec::MappingCodec;
use crate::config::DatabaseConfig;
use crate::policy::FieldPolicy;
use crate::query::QueryBuilder;
use sqlx::pool::{Pool, PoolOptions};
use std::time::Duration;

/// Where query builders get their connection from, together with the settings
/// every builder created from it inherits.
///
/// Cloning is cheap; the pool is shared.
#[derive(Debug)]
pub struct DataSource<DB: Backend> {
    pool: Pool<DB>,
    codec: MappingCodec,
    policy: FieldPolicy,
}

impl<DB: Backend> Clone for DataSource<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            codec: self.codec,
            policy: self.policy,
        }
    }
}

impl<DB: Backend> DataSource<DB> {
    /// Wraps an existing pool with the JSON codec and lenient field policy.
    pub fn new(pool: Pool<DB>) -> Self {
        Self {
            pool,
            codec: MappingCodec::default(),
            policy: FieldPolicy::default(),
        }
    }

    /// Opens a pool as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) when no URL is configured and
    /// [`Error::Database`](crate::Error::Database) when the pool cannot connect.
    pub async fn connect(config: &DatabaseConfig) -> crate::Result<Self> {
        let url = config.url()?;
        let pool = PoolOptions::<DB>::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;
        tracing::debug!(
            database = DB::NAME,
            max_connections = config.max_connections,
            "connected data source"
        );
        Ok(Self::new(pool)
            .with_codec(config.codec())
            .with_policy(config.policy()))
    }

    #[must_use]
    pub fn with_codec(mut self, codec: MappingCodec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    pub fn codec(&self) -> MappingCodec {
        self.codec
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Shorthand for [`QueryBuilder::create`].
    pub async fn query(&self, template: &str) -> crate::Result<QueryBuilder<DB>> {
        QueryBuilder::create(self, template).await
    }
}
