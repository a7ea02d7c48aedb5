pub mod core;
pub mod engine;
pub mod media;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
