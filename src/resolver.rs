use crate::aliases::AliasTable;
use crate::catalog::{CatalogEntry, CatalogStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

static OBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("object id pattern is valid"));

/// Whether `text` has the shape of a raw catalog identifier.
pub fn is_object_id(text: &str) -> bool {
    OBJECT_ID.is_match(text)
}

/// How an input was matched to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Id,
    Alias,
    Fuzzy { distance: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub entry: CatalogEntry,
    pub kind: MatchKind,
}

/// Maps free-form text to a catalog entry: raw id, then alias, then nearest name.
#[derive(Clone)]
pub struct Resolver {
    catalog: Arc<CatalogStore>,
    aliases: Arc<AliasTable>,
}

impl Resolver {
    pub fn new(catalog: Arc<CatalogStore>, aliases: Arc<AliasTable>) -> Self {
        Self { catalog, aliases }
    }

    pub fn resolve(&self, input: &str) -> Option<Resolution> {
        let query = input.trim().to_lowercase();

        // A well-formed id never falls through to fuzzy matching
        if is_object_id(&query) {
            debug!(query = %query, "Resolving as object id");
            return self.catalog.find_by_id(&query).map(|entry| Resolution {
                entry,
                kind: MatchKind::Id,
            });
        }

        if let Some(id) = self.aliases.reverse_lookup(&query) {
            debug!(query = %query, id = %id, "Resolving via alias");
            return self.catalog.find_by_id(&id).map(|entry| Resolution {
                entry,
                kind: MatchKind::Alias,
            });
        }

        let snapshot = self.catalog.all();
        let (entry, distance) = nearest_by_name(&snapshot, &query)?;
        debug!(query = %query, id = %entry.id(), distance, "Resolved by name");
        Some(Resolution {
            entry: entry.clone(),
            kind: MatchKind::Fuzzy { distance },
        })
    }
}

/// Entry whose lowercase name has the smallest Levenshtein distance to `query`.
/// The first of several equally close entries wins.
pub fn nearest_by_name<'a>(
    entries: &'a [CatalogEntry],
    query: &str,
) -> Option<(&'a CatalogEntry, usize)> {
    entries
        .iter()
        .map(|entry| (entry, strsim::levenshtein(&entry.lowercase_name(), query)))
        .min_by_key(|(_, distance)| *distance)
}
