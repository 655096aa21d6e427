pub mod analytics;
pub mod auth;
pub mod bootstrap;
pub mod catalog;
pub mod certificates;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod models;
pub mod progress;
pub mod quiz;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test;

pub use error::AppError;
pub use store::Store;
