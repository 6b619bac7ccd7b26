use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};
use crate::memory::MemoryMessageStore;
use crate::store::MessageStore;

/// Which message store to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
    Mongodb,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
            StoreBackend::Mongodb => "mongodb",
        };
        f.write_str(name)
    }
}

impl FromStr for StoreBackend {
    type Err = PersistError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            other => Err(PersistError::UnsupportedBackend(other.to_string())),
        }
    }
}

pub struct StoreBuilder {
    backend: StoreBackend,
    url: Option<String>,
    database: String,
    max_connections: u32,
    connect_timeout: Duration,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            database: "washdesk".to_string(),
            max_connections: 20,
            connect_timeout: Duration::from_secs(2),
        }
    }

    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub async fn build(self) -> Result<Arc<dyn MessageStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryMessageStore::new())),
            StoreBackend::Postgres => self.build_postgres().await,
            StoreBackend::Mongodb => self.build_mongodb().await,
        }
    }

    fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PersistError::Internal(format!("a database url is required for the {} backend", self.backend)))
    }

    #[cfg(feature = "postgres")]
    async fn build_postgres(self) -> Result<Arc<dyn MessageStore>> {
        let url = self.require_url()?;
        let store =
            crate::dbs::postgres::PostgresMessageStore::connect(url, self.max_connections, self.connect_timeout)
                .await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "postgres"))]
    async fn build_postgres(self) -> Result<Arc<dyn MessageStore>> {
        self.require_url()?;
        Err(PersistError::UnsupportedBackend(
            "postgres (build with the `postgres` feature)".to_string(),
        ))
    }

    #[cfg(feature = "mongodb")]
    async fn build_mongodb(self) -> Result<Arc<dyn MessageStore>> {
        let url = self.require_url()?;
        let store = crate::dbs::mongo::MongoMessageStore::connect(url, &self.database).await?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn build_mongodb(self) -> Result<Arc<dyn MessageStore>> {
        self.require_url()?;
        Err(PersistError::UnsupportedBackend(
            "mongodb (build with the `mongodb` feature)".to_string(),
        ))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
