// Probe constants (no magic values in the procedure)

/// Database designator for a private in-memory session
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Query asking the geospatial extension for its own version
pub const DEFAULT_QUERY: &str = "SELECT ogr_version()";

/// Flat table position of row 0, column 0 in a one-column result
/// (position 0 holds the column header)
pub const VERSION_CELL: usize = 1;
