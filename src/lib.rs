pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod render;
pub mod scrapers;
pub mod server;
pub mod shaper;
pub mod snapshot;

pub use cli::Args;
pub use config::Config;
pub use error::AppError;
pub use server::{router, serve, AppState};
