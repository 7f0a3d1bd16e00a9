// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod models;
pub mod render;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};
