//! Sticker catalog: the entry model and the swappable snapshot store.

pub mod entry;
pub mod store;

pub use entry::{CatalogEntry, ImageRecord, ImageSpec, StickerRecord};
pub use store::CatalogStore;
