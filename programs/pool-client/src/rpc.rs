//! Read-only Solana JSON-RPC calls.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use anchor_lang::prelude::Pubkey;
use anchor_lang::{AccountDeserialize, Discriminator};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::constants::*;
use crate::error::ClientError;
use crate::state::{Participants, Pool};
use crate::transport::{HttpRequest, Transport};

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct WithContext<V> {
    value: V,
}

#[derive(Deserialize)]
struct AccountInfo {
    /// `[data, encoding]`
    data: (String, String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    amount: String,
}

#[derive(Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountInfo,
}

pub struct SolanaRpc<T> {
    transport: T,
    next_id: AtomicU64,
}

impl<T: Transport> SolanaRpc<T> {
    /// `transport` must be rooted at the RPC endpoint itself.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<R, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        debug!(method, id, "rpc call");

        let response = self.transport.send(HttpRequest::post("", body)).await?;
        if !response.is_success() {
            return Err(ClientError::FetchFailed {
                resource: method.to_string(),
                status: response.status,
            });
        }
        let parsed: RpcResponse<R> = response.json(method)?;
        if let Some(error) = parsed.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        parsed.result.ok_or_else(|| ClientError::InvalidResponse {
            resource: method.to_string(),
            reason: "neither result nor error present".to_string(),
        })
    }

    /// Lamports held by `address`.
    pub async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        let balance: WithContext<u64> = self
            .call("getBalance", json!([address.to_string(), { "commitment": "confirmed" }]))
            .await?;
        Ok(balance.value)
    }

    /// [`get_balance`](Self::get_balance) retried up to
    /// [`BALANCE_FETCH_ATTEMPTS`] times with linear backoff.
    pub async fn native_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        let mut attempt = 1;
        loop {
            match self.get_balance(address).await {
                Ok(lamports) => return Ok(lamports),
                Err(e) if attempt < BALANCE_FETCH_ATTEMPTS => {
                    warn!(%address, attempt, error = %e, "balance fetch failed, retrying");
                    tokio::time::sleep(BALANCE_RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Raw token amount in `owner`'s associated token account for `mint`.
    /// A missing account reads as zero.
    pub async fn token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<u64, ClientError> {
        let ata = get_associated_token_address_with_program_id(owner, mint, token_program);
        let result: Result<WithContext<TokenAmount>, _> = self
            .call("getTokenAccountBalance", json!([ata.to_string(), { "commitment": "confirmed" }]))
            .await;
        match result {
            Ok(balance) => balance.value.amount.parse().map_err(|_| ClientError::InvalidResponse {
                resource: "getTokenAccountBalance".to_string(),
                reason: format!("amount {:?} is not an integer", balance.value.amount),
            }),
            Err(ClientError::Rpc { message, .. }) if message.contains("could not find account") => {
                debug!(%owner, %mint, "no token account");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Account data, or `None` when the account does not exist.
    pub async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        let info: WithContext<Option<AccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), { "encoding": "base64", "commitment": "confirmed" }]),
            )
            .await?;
        info.value.map(|account| decode_data(&account)).transpose()
    }

    pub async fn fetch_pool(&self, address: &Pubkey) -> Result<Option<Pool>, ClientError> {
        self.fetch_account(address, "Pool").await
    }

    pub async fn fetch_participants(&self, pool: &Pubkey) -> Result<Option<Participants>, ClientError> {
        let (address, _) = Participants::address(pool);
        self.fetch_account(&address, "Participants").await
    }

    async fn fetch_account<A: AccountDeserialize>(
        &self,
        address: &Pubkey,
        what: &'static str,
    ) -> Result<Option<A>, ClientError> {
        self.account_data(address)
            .await?
            .map(|data| deserialize_account(&data, what))
            .transpose()
    }

    /// Every pool account owned by the program, filtered by the `Pool`
    /// account discriminator.
    pub async fn list_pools(&self) -> Result<Vec<(Pubkey, Pool)>, ClientError> {
        let filter = json!({
            "memcmp": { "offset": 0, "bytes": STANDARD.encode(Pool::DISCRIMINATOR), "encoding": "base64" }
        });
        let accounts: Vec<KeyedAccount> = self
            .call(
                "getProgramAccounts",
                json!([crate::ID.to_string(), { "encoding": "base64", "filters": [filter] }]),
            )
            .await?;

        let mut pools = Vec::with_capacity(accounts.len());
        for keyed in accounts {
            let address = Pubkey::from_str(&keyed.pubkey).map_err(|e| ClientError::Decode {
                what: "account address",
                reason: e.to_string(),
            })?;
            match deserialize_account::<Pool>(&decode_data(&keyed.account)?, "Pool") {
                Ok(pool) => pools.push((address, pool)),
                // Older layouts share the discriminator but not the size.
                Err(e) => warn!(%address, error = %e, "skipping undecodable pool account"),
            }
        }
        debug!(count = pools.len(), "listed pool accounts");
        Ok(pools)
    }
}

fn decode_data(account: &AccountInfo) -> Result<Vec<u8>, ClientError> {
    let (data, encoding) = &account.data;
    if encoding != "base64" {
        return Err(ClientError::Decode {
            what: "account data",
            reason: format!("unexpected encoding {encoding}"),
        });
    }
    STANDARD.decode(data).map_err(|e| ClientError::Decode {
        what: "account data",
        reason: e.to_string(),
    })
}

fn deserialize_account<A: AccountDeserialize>(data: &[u8], what: &'static str) -> Result<A, ClientError> {
    let mut slice = data;
    A::try_deserialize(&mut slice).map_err(|e| ClientError::Decode {
        what,
        reason: e.to_string(),
    })
}
