// Extprobe Infrastructure - Dynamic Loader Adapter
// Implements: EngineLoader, EngineLibrary

#[cfg(not(target_family = "wasm"))]
mod ffi;
#[cfg(not(target_family = "wasm"))]
mod native;
#[cfg(target_family = "wasm")]
mod unsupported;

#[cfg(not(target_family = "wasm"))]
pub use native::{DynamicEngine, DynamicEngineLoader, Session, Table};
#[cfg(target_family = "wasm")]
pub use unsupported::{DynamicEngine, DynamicEngineLoader, Session, Table};
