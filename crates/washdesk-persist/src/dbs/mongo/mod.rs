mod client;
mod models;

pub use client::MongoMessageStore;
pub use models::MongoMessageDoc;
