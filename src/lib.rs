//! Summoner refresh pipeline and challenge aggregation for a League of
//! Legends stats tracker.

pub mod challenges;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod poller;
pub mod riot;
pub mod service;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::AppError;
pub use service::StatsService;
