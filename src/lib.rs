pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod layout;
pub mod middleware;
pub mod share;
pub mod source;
pub mod state;
pub mod types;
pub mod viewport;

pub use app::app;
pub use state::AppState;
