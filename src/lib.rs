pub mod api;
pub mod config;
pub mod core;
pub mod narrator;
pub mod plan;
pub mod snapshot;
