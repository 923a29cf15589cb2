pub mod aggregate;
pub mod alerts;
pub mod annotations;
pub mod audit;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod export;
pub mod filter;
pub mod goals;
pub mod models;
pub mod refresh;
pub mod source;
pub mod store;

#[cfg(feature = "tauri-app")]
pub mod app;

pub use crate::dashboard::DashboardCore;
pub use crate::db::{Database, StateGateway};
pub use crate::errors::{AppError, AppResult};
pub use crate::source::{DataSource, HttpDataSource};
