pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod positioning;
pub mod state;
pub mod store;
pub mod suggest;
pub mod ticket;
