//! Tessera server: configuration and service wiring for the content
//! services.

pub mod app;
pub mod config;
pub mod integrations;

pub use app::Services;
pub use config::ServerConfig;
