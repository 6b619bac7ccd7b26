pub mod builder;
pub mod dbs;
pub mod error;
pub mod memory;
pub mod store;

pub use builder::{StoreBackend, StoreBuilder};
pub use error::{PersistError, Result};
pub use memory::MemoryMessageStore;
pub use store::MessageStore;

#[cfg(feature = "postgres")]
pub use dbs::postgres::PostgresMessageStore;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoMessageStore;
