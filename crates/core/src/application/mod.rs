// Application Layer - The probe procedure

pub mod constants;
pub mod probe;

// Re-exports
pub use probe::{ExtensionProbe, ProbeConfig};
