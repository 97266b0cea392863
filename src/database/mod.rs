pub mod connection;
pub mod maintenance;
pub mod models;

pub use connection::DatabaseManager;
