pub mod clipboard;
pub mod compositor;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod geometry;
pub mod gesture;
pub mod loader;
pub mod logging;
pub mod notification;
pub mod placement;
pub mod preview;
pub mod services;
pub mod session;
pub mod share;
pub mod storage;
pub mod template;
pub use error::{AppError, AppResult};
