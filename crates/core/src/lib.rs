// Extprobe Core - Domain Logic & Ports
// NO native-loading dependencies: adapters live in infra crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
