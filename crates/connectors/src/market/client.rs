use crate::market::error::RemoteError;
use async_trait::async_trait;
use model::operation::Operation;

/// A live connection to the marketplace service.
///
/// The service is opaque: every call is a named operation with a JSON
/// parameter object, answered by a JSON response object.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    async fn call(
        &self,
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RemoteError>;
}
