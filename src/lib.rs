pub mod config;
pub mod dates;
pub mod engine;
pub mod grid;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;
