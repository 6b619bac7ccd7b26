mod client;
mod models;
mod schema;

pub use client::PostgresMessageStore;
