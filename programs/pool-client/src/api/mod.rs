//! Typed wrappers over the backend's REST endpoints.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::records::ResponseSchema;
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub mod leaderboard;
pub mod pools;
pub mod referrals;
pub mod upload;
pub mod winners;

pub use leaderboard::LeaderboardKind;

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    dev_routes: bool,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            dev_routes: false,
        }
    }

    /// Enables development-only endpoints such as `trigger-winner`.
    pub fn with_dev_routes(mut self, enabled: bool) -> Self {
        self.dev_routes = enabled;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch(&self, request: HttpRequest, resource: &str) -> Result<HttpResponse, ClientError> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            warn!(resource, status = response.status, "request failed");
            Err(ClientError::FetchFailed {
                resource: resource.to_string(),
                status: response.status,
            })
        }
    }

    async fn get_json<R: DeserializeOwned>(&self, path: String, resource: &str) -> Result<R, ClientError> {
        self.fetch(HttpRequest::get(path), resource).await?.json(resource)
    }

    fn body<B: Serialize>(body: &B, resource: &str) -> Result<serde_json::Value, ClientError> {
        serde_json::to_value(body).map_err(|e| ClientError::Encode {
            what: "request body",
            reason: format!("{resource}: {e}"),
        })
    }
}

/// Deserializes and schema-checks a mutation response.
fn checked<R: DeserializeOwned + ResponseSchema>(response: HttpResponse, resource: &str) -> Result<R, ClientError> {
    let parsed: R = response.json(resource)?;
    parsed.check().map_err(|reason| ClientError::InvalidResponse {
        resource: resource.to_string(),
        reason,
    })?;
    debug!(resource, "mutation response accepted");
    Ok(parsed)
}
