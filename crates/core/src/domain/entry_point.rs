// Engine entry points and symbol resolution results

use std::fmt;

/// Prefix used by the engine's own builds
pub const PRIMARY_PREFIX: &str = "sqlite3_";

/// Prefix used by distributions that rename the engine's symbols
/// to avoid clashing with a system-installed copy
pub const ALTERNATE_PREFIX: &str = "SPLite3_";

/// A primary symbol name and its documented alternate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolPair {
    pub primary: &'static str,
    pub alternate: &'static str,
}

impl SymbolPair {
    /// Names in resolution order
    pub fn candidates(&self) -> [&'static str; 2] {
        [self.primary, self.alternate]
    }
}

/// Engine entry points consumed by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Open,
    EnableLoadExtension,
    LoadExtension,
    GetTable,
    FreeTable,
    Close,
    ErrMsg,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 7] = [
        EntryPoint::Open,
        EntryPoint::EnableLoadExtension,
        EntryPoint::LoadExtension,
        EntryPoint::GetTable,
        EntryPoint::FreeTable,
        EntryPoint::Close,
        EntryPoint::ErrMsg,
    ];

    pub const fn symbols(self) -> SymbolPair {
        match self {
            EntryPoint::Open => SymbolPair {
                primary: "sqlite3_open",
                alternate: "SPLite3_open",
            },
            EntryPoint::EnableLoadExtension => SymbolPair {
                primary: "sqlite3_enable_load_extension",
                alternate: "SPLite3_enable_load_extension",
            },
            EntryPoint::LoadExtension => SymbolPair {
                primary: "sqlite3_load_extension",
                alternate: "SPLite3_load_extension",
            },
            EntryPoint::GetTable => SymbolPair {
                primary: "sqlite3_get_table",
                alternate: "SPLite3_get_table",
            },
            EntryPoint::FreeTable => SymbolPair {
                primary: "sqlite3_free_table",
                alternate: "SPLite3_free_table",
            },
            EntryPoint::Close => SymbolPair {
                primary: "sqlite3_close",
                alternate: "SPLite3_close",
            },
            EntryPoint::ErrMsg => SymbolPair {
                primary: "sqlite3_errmsg",
                alternate: "SPLite3_errmsg",
            },
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols().primary)
    }
}

/// Result of resolving an entry point in a loaded library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Resolved under `symbol` (primary or alternate name)
    Present { symbol: &'static str, value: T },
    /// Neither name is exported
    Absent(EntryPoint),
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Present { symbol, value } => Lookup::Present {
                symbol,
                value: f(value),
            },
            Lookup::Absent(entry) => Lookup::Absent(entry),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present { .. })
    }

    /// Resolved symbol name, if any
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Lookup::Present { symbol, .. } => Some(symbol),
            Lookup::Absent(_) => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Present { value, .. } => Some(value),
            Lookup::Absent(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_pairs_follow_prefixes() {
        for entry in EntryPoint::ALL {
            let pair = entry.symbols();
            let suffix = pair.primary.strip_prefix(PRIMARY_PREFIX).unwrap();
            assert_eq!(pair.alternate, format!("{ALTERNATE_PREFIX}{suffix}"));
        }
    }

    #[test]
    fn test_candidates_try_primary_first() {
        let pair = EntryPoint::Open.symbols();
        assert_eq!(pair.candidates(), ["sqlite3_open", "SPLite3_open"]);
    }

    #[test]
    fn test_lookup_map_keeps_symbol() {
        let lookup = Lookup::Present {
            symbol: "SPLite3_close",
            value: 0,
        };
        let mapped = lookup.map(|code| code + 5);
        assert_eq!(mapped.symbol(), Some("SPLite3_close"));
        assert_eq!(mapped.into_option(), Some(5));

        let absent: Lookup<i32> = Lookup::Absent(EntryPoint::Close);
        assert!(!absent.is_present());
        assert_eq!(absent.map(|c| c + 1), Lookup::Absent(EntryPoint::Close));
    }
}
