use anyhow::Result;
use async_trait::async_trait;
use nowplaying_status_core::StatusPayload;

#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, status: &StatusPayload) -> Result<Option<StatusPayload>>;

    // `Ok(false)` means there was nothing to clear.
    async fn clear(&self) -> Result<bool>;
}
