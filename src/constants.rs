//! Fixed values shared by the catalog, alias table and webhook.

// Catalog source
pub const DEFAULT_CATALOG_URL: &str = "https://api.foursquare.com/v2/stickers/all";
pub const CATALOG_MODE: &str = "swarm";

// Image sizes the catalog publishes (the `sizes` response is hardcoded)
pub const AVAILABLE_SIZES: [u32; 4] = [60, 94, 150, 300];
pub const DEFAULT_IMAGE_SIZE: u32 = 150;

// Alias table
pub const MAX_ALIAS_LEN: usize = 80;
/// Document key the whole alias mapping is stored under.
pub const ALIASES_DOCUMENT_ID: &str = "56e0832ee4b0d99a76088c4d";

// Chat delivery
pub const STICKER_ICON_EMOJI: &str = ":thief:";
pub const ATTACHMENT_COLOR: &str = "#ffa633";

// Server
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_LOG_DIR: &str = "logs";
