pub mod app;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod graph;
pub mod shared;
pub mod store;
pub mod templates;
pub mod workspace;
