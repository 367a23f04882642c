// Domain Layer - Entry points, lookups and probe outcomes

pub mod entry_point;
pub mod outcome;
pub mod request;

// Re-exports
pub use entry_point::{EntryPoint, Lookup, SymbolPair};
pub use outcome::{ExitStatus, Failure, NativeStatus, ProbeOutcome, SkipReason, SKIP_TOKEN};
pub use request::ProbeRequest;
