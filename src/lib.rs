//! Wakabeat - WakaTime-compatible editor activity heartbeat reporter

pub mod activity;
pub mod config;
pub mod error;
pub mod feed;
pub mod heartbeat;

pub use config::Config;
