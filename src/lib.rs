// Library entry so integration tests and external tools can reference internal modules.
// Re-export the same modules used by the binary (`main.rs`).
pub mod config;
pub mod handler;
pub mod model;
pub mod orders;
pub mod replies;
pub mod router;
pub mod transport;
pub mod web;

// Convenient re-exports for frequently used types (optional expansion later).
pub use model::AppState;
