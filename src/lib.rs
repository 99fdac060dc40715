// src/lib.rs

pub mod assessment;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod routes;
pub mod sandbox;
pub mod state;
pub mod store;
pub mod tutor;
pub mod utils;

// Re-export specific items for convenience if needed
pub use routes::create_router;
