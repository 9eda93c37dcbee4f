pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod mailing;
pub mod models;
pub mod routes;
pub mod serve;
pub mod state;
pub mod stats;

pub use config::{Config, EnvConfig};
pub use error::Error;
pub use serve::serve;
pub use state::AppState;
