//! User-defined aliases for catalog identifiers, with write-behind persistence.

#[cfg(feature = "db")]
pub mod libsql_store;
pub mod store;
pub mod table;

use crate::constants::MAX_ALIAS_LEN;
use indexmap::IndexMap;

/// Identifier -> aliases, most recent first. Identifier order is insertion order and is the
/// order every "first match" scan follows.
pub type AliasMap = IndexMap<String, Vec<String>>;

pub use store::{AliasStore, InMemoryAliasStore, SqliteAliasStore};
pub use table::AliasTable;

/// Trims, lowercases and caps an alias at 80 characters.
pub fn sanitize_alias(raw: &str) -> String {
    raw.trim().to_lowercase().chars().take(MAX_ALIAS_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_trims_and_lowercases() {
        assert_eq!(sanitize_alias("  Foo Bar  "), "foo bar");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(120);
        assert_eq!(sanitize_alias(&long).chars().count(), 80);
        assert_eq!(sanitize_alias(&"é".repeat(90)).chars().count(), 80);
    }
}
