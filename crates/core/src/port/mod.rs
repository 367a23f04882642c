// Port Layer - Interfaces for the native engine

pub mod engine;

// Re-exports
pub use engine::{CallResult, EngineLibrary, EngineLoader, LoadError, ResultTable};
