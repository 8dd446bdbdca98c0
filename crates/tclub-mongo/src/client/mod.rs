//! MongoDB client and connection configuration.

mod mongo_client;
mod mongo_config;

pub use mongo_client::MongoClient;
pub use mongo_config::MongoConfig;
