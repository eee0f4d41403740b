// Web服务器模块

pub mod auth;
pub mod handlers;
pub mod state;

pub use auth::AuthGate;
pub use state::AppState;
