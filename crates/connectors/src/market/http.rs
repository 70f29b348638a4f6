use crate::market::{client::MarketplaceClient, error::RemoteError};
use async_trait::async_trait;
use model::operation::Operation;
use tracing::debug;

pub const PRODUCTION_ENDPOINT: &str = "https://mturk-requester.us-east-1.amazonaws.com";
pub const SANDBOX_ENDPOINT: &str = "https://mturk-requester-sandbox.us-east-1.amazonaws.com";

const TARGET_PREFIX: &str = "MTurkRequesterServiceV20170117";

#[derive(Clone)]
pub struct Credentials {
    pub access: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &self.access)
            .field("secret", &"***")
            .finish()
    }
}

/// JSON-over-HTTP client. Each operation is a POST of the parameter object
/// to the endpoint, with the operation named in the target header. Request
/// signing is left to the gateway in front of `endpoint`.
pub struct HttpMarketplaceClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

impl HttpMarketplaceClient {
    pub fn new(credentials: Credentials, endpoint: Option<String>, sandbox: bool) -> Self {
        let endpoint = endpoint.unwrap_or_else(|| {
            if sandbox {
                SANDBOX_ENDPOINT.to_string()
            } else {
                PRODUCTION_ENDPOINT.to_string()
            }
        });

        HttpMarketplaceClient {
            client: reqwest::Client::new(),
            endpoint,
            credentials,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn call(
        &self,
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RemoteError> {
        debug!("POST {} {}", self.endpoint, operation);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", target(operation))
            .header("Content-Type", "application/x-amz-json-1.1")
            .basic_auth(&self.credentials.access, Some(&self.credentials.secret))
            .json(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<serde_json::Value>().await?;
        Ok(body)
    }
}

/// Value of the target header naming `operation`.
fn target(operation: Operation) -> String {
    format!("{TARGET_PREFIX}.{}", operation.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            access: "AKIA".to_string(),
            secret: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_endpoint_selection() {
        let prod = HttpMarketplaceClient::new(credentials(), None, false);
        let sandbox = HttpMarketplaceClient::new(credentials(), None, true);
        let custom =
            HttpMarketplaceClient::new(credentials(), Some("http://localhost:9000".into()), true);

        assert_eq!(prod.endpoint(), PRODUCTION_ENDPOINT);
        assert_eq!(sandbox.endpoint(), SANDBOX_ENDPOINT);
        assert_eq!(custom.endpoint(), "http://localhost:9000");
    }

    #[test]
    fn test_target_names_the_operation() {
        assert_eq!(
            target(Operation::GrantBonus),
            "MTurkRequesterServiceV20170117.SendBonus"
        );
        assert_eq!(
            target(Operation::AssignQualification),
            "MTurkRequesterServiceV20170117.AssociateQualificationWithWorker"
        );
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("AKIA"));
        assert!(!rendered.contains("s3cret"));
    }
}
