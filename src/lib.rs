pub mod auth;
pub mod config;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod handlers;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use error::{AppError, AppResult};
