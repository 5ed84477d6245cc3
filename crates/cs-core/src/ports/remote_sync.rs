use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ports::errors::TransportError;
use crate::sync::protocol::{SyncExchangeData, SyncExchangeRequest};

/// Where and how patiently to reach the remote authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub server_url: String,
    pub timeout: Duration,
    pub max_retry_attempts: u32,
}

#[async_trait]
pub trait RemoteSyncPort: Send + Sync {
    /// One combined push/pull exchange.
    async fn exchange(
        &self,
        endpoint: &RemoteEndpoint,
        request: &SyncExchangeRequest,
        cancel: CancellationToken,
    ) -> Result<SyncExchangeData, TransportError>;
}
