pub mod config;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod store;
pub mod tracker;
pub mod types;
