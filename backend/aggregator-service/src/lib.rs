pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result, UpstreamError};
pub use services::Aggregator;
