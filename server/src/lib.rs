// Library exports for testing and reuse

pub mod config;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod upstream;
