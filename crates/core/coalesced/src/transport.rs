use async_trait::async_trait;
use batchgate_result::Result;

use crate::{BatchRequest, ItemsResponse};

/// Outbound side of the coalescer.
///
/// Implementations perform exactly one network call per `send` and report
/// any failure (connection, status, decoding) as a `TransportError`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &BatchRequest) -> Result<ItemsResponse>;
}
