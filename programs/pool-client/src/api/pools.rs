use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::{checked, ApiClient};
use crate::error::ClientError;
use crate::records::*;
use crate::transport::{HttpRequest, HttpResponse, Transport};

const POOLS: &str = "pools";

impl<T: Transport> ApiClient<T> {
    /// `GET /api/pools`, in server order.
    pub async fn list_pools(&self) -> Result<Vec<PoolRecord>, ClientError> {
        let listing: Listing<PoolRecord> = self.get_json("/api/pools".to_string(), POOLS).await?;
        let pools = listing.into_vec();
        for pool in &pools {
            pool.warn_on_violations();
        }
        Ok(pools)
    }

    /// `GET /api/pools/:id`. A 404 is `PoolNotFound`; other failures are `FetchFailed`.
    pub async fn get_pool(&self, id: &str) -> Result<PoolDetail, ClientError> {
        let response = self.pool_request(HttpRequest::get(pool_path(id, "")), id).await?;
        let detail: PoolDetail = response.json("pool")?;
        detail.pool.warn_on_violations();
        Ok(detail)
    }

    /// `POST /api/pools`.
    pub async fn create_pool(&self, request: &CreatePoolRequest) -> Result<PoolMutationResponse, ClientError> {
        let body = Self::body(request, "create pool")?;
        let response = self.fetch(HttpRequest::post("/api/pools", body), "create pool").await?;
        let created: PoolMutationResponse = checked(response, "create pool")?;
        info!(pool = %created.pool.id, "pool record created");
        Ok(created)
    }

    /// `POST /api/pools/:id`, used to record confirmation or status changes.
    pub async fn update_pool(&self, id: &str, request: &UpdatePoolRequest) -> Result<PoolMutationResponse, ClientError> {
        self.pool_mutation(id, "", Self::body(request, "update pool")?).await
    }

    /// `POST /api/pools/:id/join`.
    pub async fn join_pool(&self, id: &str, request: &JoinPoolRequest) -> Result<JoinPoolResponse, ClientError> {
        self.pool_mutation(id, "/join", Self::body(request, "join pool")?).await
    }

    /// `POST /api/pools/:id/donate`.
    pub async fn donate(&self, id: &str, request: &DonateRequest) -> Result<DonateResponse, ClientError> {
        self.pool_mutation(id, "/donate", Self::body(request, "donate")?).await
    }

    /// `POST /api/pools/:id/trigger-winner`. Development only.
    pub async fn trigger_winner(&self, id: &str) -> Result<TriggerWinnerResponse, ClientError> {
        if !self.dev_routes {
            return Err(ClientError::DevRoutesDisabled);
        }
        self.pool_mutation(id, "/trigger-winner", serde_json::json!({})).await
    }

    async fn pool_mutation<R: DeserializeOwned + ResponseSchema>(
        &self,
        id: &str,
        suffix: &str,
        body: serde_json::Value,
    ) -> Result<R, ClientError> {
        let response = self.pool_request(HttpRequest::post(pool_path(id, suffix), body), id).await?;
        checked(response, POOLS)
    }

    async fn pool_request(&self, request: HttpRequest, id: &str) -> Result<HttpResponse, ClientError> {
        let response = self.transport.send(request).await?;
        match response.status {
            404 => {
                warn!(pool = id, "pool not found");
                Err(ClientError::PoolNotFound)
            }
            _ if response.is_success() => Ok(response),
            status => Err(ClientError::FetchFailed {
                resource: format!("pool {id}"),
                status,
            }),
        }
    }
}

fn pool_path(id: &str, suffix: &str) -> String {
    format!("/api/pools/{id}{suffix}")
}
