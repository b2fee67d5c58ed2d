use crate::catalog::StickerRecord;
use crate::error::Result;
use crate::slack::SlackPayload;

/// Remote source of sticker records
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every sticker record the source publishes
    async fn fetch(&self) -> Result<Vec<StickerRecord>>;
}

/// Outgoing chat delivery
#[async_trait::async_trait]
pub trait ChatSink: Send + Sync {
    /// Post one message; any non-success response is an error
    async fn post(&self, payload: &SlackPayload) -> Result<()>;
}
