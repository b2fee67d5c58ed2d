use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One sticker record as the catalog API returns it.
///
/// Every field is optional at the wire level; [`CatalogEntry::from_record`] decides which
/// records are usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub restricted: bool,
    pub image: Option<ImageRecord>,
}

/// Image addressing as sent by the API. The API calls the suffix `name`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRecord {
    pub prefix: Option<String>,
    #[serde(rename = "name")]
    pub suffix: Option<String>,
    #[serde(default)]
    pub sizes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub sizes: BTreeSet<u32>,
}

/// An immutable sticker from one catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    id: String,
    name: Option<String>,
    restricted: bool,
    image: Option<ImageSpec>,
}

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        restricted: bool,
        image: Option<ImageSpec>,
    ) -> Self {
        Self {
            id: id.into(),
            name,
            restricted,
            image,
        }
    }

    /// Builds an entry from a wire record. Records without an `id` are dropped.
    pub fn from_record(record: StickerRecord) -> Option<Self> {
        let id = record.id.filter(|id| !id.is_empty())?;
        let image = record.image.map(|img| ImageSpec {
            prefix: img.prefix.filter(|p| !p.is_empty()),
            suffix: img.suffix.filter(|s| !s.is_empty()),
            sizes: img.sizes.into_iter().collect(),
        });
        Some(Self::new(id, record.name, record.restricted, image))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name; empty for entries that never pass [`CatalogEntry::is_valid`].
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn lowercase_name(&self) -> String {
        self.name().to_lowercase()
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn is_valid(&self) -> bool {
        self.name.is_some() && !self.restricted
    }

    /// `prefix + size + suffix`, only for a size the entry publishes.
    pub fn image_url(&self, size: u32) -> Option<String> {
        let image = self.image.as_ref()?;
        let prefix = image.prefix.as_deref()?;
        let suffix = image.suffix.as_deref()?;
        if !image.sizes.contains(&size) {
            return None;
        }
        Some(format!("{prefix}{size}{suffix}"))
    }
}
