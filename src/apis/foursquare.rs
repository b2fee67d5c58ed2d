use crate::catalog::StickerRecord;
use crate::constants::CATALOG_MODE;
use crate::error::{Result, StickerError};
use crate::types::CatalogSource;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    response: Option<CatalogBody>,
}

#[derive(Debug, Deserialize)]
struct CatalogBody {
    stickers: Option<Vec<Value>>,
}

/// Sticker catalog served by the Foursquare v2 API.
pub struct FoursquareCatalog {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl FoursquareCatalog {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token: token.into(),
        }
    }
}

/// API version parameter: the given date as `YYYYMMDD`.
pub fn client_version(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Extracts sticker records from a catalog response body.
///
/// A body without `response.stickers` is an error so the caller keeps its current
/// snapshot. Individual records that do not fit the schema are skipped.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<StickerRecord>> {
    let envelope: CatalogEnvelope = serde_json::from_slice(body)?;
    let stickers = envelope
        .response
        .and_then(|r| r.stickers)
        .ok_or_else(|| StickerError::MissingField("response.stickers".to_string()))?;

    let mut records = Vec::with_capacity(stickers.len());
    for raw in stickers {
        match serde_json::from_value::<StickerRecord>(raw) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed sticker record: {}", e),
        }
    }
    Ok(records)
}

#[async_trait::async_trait]
impl CatalogSource for FoursquareCatalog {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<StickerRecord>> {
        let version = client_version(Local::now().date_naive());
        debug!(url = %self.url, version = %version, "Fetching sticker catalog");

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("oauth_token", self.token.as_str()),
                ("v", version.as_str()),
                ("m", CATALOG_MODE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StickerError::Api {
                message: format!("Got code {}", status.as_u16()),
            });
        }

        let body = response.bytes().await?;
        parse_catalog(&body)
    }
}
