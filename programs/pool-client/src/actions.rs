//! User-facing actions.
//!
//! Each action validates input locally, sends the program instruction,
//! records the result with the backend and reports the outcome as a
//! notification. Every failure, whichever layer raised it, becomes exactly
//! one error notification.

use std::str::FromStr;
use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use tracing::info;

use crate::error::ClientError;
use crate::instructions::CreatePoolArgs;
use crate::notify::NotificationCenter;
use crate::query::{PoolList, PoolQueries};
use crate::records::*;
use crate::sdk::{BatchItem, CreatedPool, PoolProgram, PoolSdk, Progress, Signature};
use crate::transport::Transport;
use crate::validate::{check_balance, format_amount, parse_amount, validate_donation};

pub struct PoolActions<P, T> {
    sdk: PoolSdk<P>,
    queries: Arc<PoolQueries<T>>,
    notifications: Arc<NotificationCenter>,
}

impl<P: PoolProgram, T: Transport> PoolActions<P, T> {
    pub fn new(sdk: PoolSdk<P>, queries: Arc<PoolQueries<T>>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            sdk,
            queries,
            notifications,
        }
    }

    pub fn sdk(&self) -> &PoolSdk<P> {
        &self.sdk
    }

    pub fn queries(&self) -> &PoolQueries<T> {
        &self.queries
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    fn reported<R>(&self, result: Result<R, ClientError>) -> Result<R, ClientError> {
        if let Err(e) = &result {
            self.notifications.report_error(e);
        }
        result
    }

    fn wallet(&self) -> Result<Pubkey, ClientError> {
        self.sdk.session().pubkey().ok_or(ClientError::Unauthenticated)
    }

    /// Joins `pool` paying its entry amount. `balance` is the wallet's
    /// balance of the pool token in native units, when known.
    pub async fn join(&self, pool: &PoolRecord, decimals: u8, balance: Option<u64>) -> Result<Signature, ClientError> {
        let result = self.try_join(pool, decimals, balance).await;
        if result.is_ok() {
            self.notifications
                .success("Joined Pool", format!("You entered the {} pool.", pool.token_symbol));
        }
        self.reported(result)
    }

    async fn try_join(&self, pool: &PoolRecord, decimals: u8, balance: Option<u64>) -> Result<Signature, ClientError> {
        let amount = parse_amount(&pool.entry_amount.to_string(), decimals)?;
        if let Some(balance) = balance {
            check_balance(amount, balance, decimals)?;
        }
        let wallet = self.wallet()?;
        let address = on_chain_address(pool)?;

        let signature = self.sdk.join_pool(address, amount).await?;
        let request = JoinPoolRequest {
            wallet_address: wallet.to_string(),
            tx_signature: signature.clone(),
        };
        self.queries.join_pool(&pool.id, &request).await?;
        info!(pool = %pool.id, %signature, "joined pool");
        Ok(signature)
    }

    /// Donates `input` tokens to `pool`. The amount is checked before any
    /// network call.
    pub async fn donate(
        &self,
        pool: &PoolRecord,
        input: &str,
        decimals: u8,
        balance: Option<u64>,
    ) -> Result<Signature, ClientError> {
        let result = self.try_donate(pool, input, decimals, balance).await;
        if result.is_ok() {
            self.notifications.success(
                "Donation Sent",
                format!("You added {} {} to the pot.", input.trim(), pool.token_symbol),
            );
        }
        self.reported(result)
    }

    async fn try_donate(
        &self,
        pool: &PoolRecord,
        input: &str,
        decimals: u8,
        balance: Option<u64>,
    ) -> Result<Signature, ClientError> {
        let amount = validate_donation(input, decimals)?;
        if let Some(balance) = balance {
            check_balance(amount, balance, decimals)?;
        }
        let wallet = self.wallet()?;
        let address = on_chain_address(pool)?;

        let signature = self.sdk.donate(address, amount).await?;
        let request = DonateRequest {
            wallet_address: wallet.to_string(),
            amount: ui_amount(amount, decimals),
            tx_signature: signature.clone(),
        };
        self.queries.donate(&pool.id, &request).await?;
        info!(pool = %pool.id, %signature, amount, "donated");
        Ok(signature)
    }

    /// Creates the pool on chain, then records it with the backend.
    /// `listing` supplies the display fields; its address, signature and
    /// creator are filled in here.
    pub async fn create(
        &self,
        mint: Pubkey,
        args: CreatePoolArgs,
        decimals: u8,
        listing: CreatePoolRequest,
    ) -> Result<(CreatedPool, PoolRecord), ClientError> {
        let result = self.try_create(mint, args, decimals, listing).await;
        if let Ok((_, record)) = &result {
            self.notifications
                .success("Pool Created", format!("Your {} pool is live.", record.token_symbol));
        }
        self.reported(result)
    }

    async fn try_create(
        &self,
        mint: Pubkey,
        args: CreatePoolArgs,
        decimals: u8,
        listing: CreatePoolRequest,
    ) -> Result<(CreatedPool, PoolRecord), ClientError> {
        args.validate(decimals)?;
        let wallet = self.wallet()?;
        let entry_amount = ui_amount(args.amount, decimals);
        let lock_duration = args.lock_duration;
        let max_participants = args.max_participants as u32;

        let created = self.sdk.create_pool(mint, args, decimals).await?;
        let request = CreatePoolRequest {
            pool_address: Some(created.pool.to_string()),
            mint: mint.to_string(),
            entry_amount,
            max_participants,
            lock_duration,
            creator_wallet: wallet.to_string(),
            tx_signature: Some(created.signature.clone()),
            ..listing
        };
        let response = self.queries.create_pool(&request).await?;
        info!(pool = %response.pool.id, address = %created.pool, "pool created");
        Ok((created, response.pool))
    }

    /// Claims refunds from every pool in `pools`. Failed items are reported
    /// individually; the batch result is returned either way.
    pub async fn claim_refunds(
        &self,
        pools: &[Pubkey],
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<BatchItem>, ClientError> {
        let result = self.sdk.claim_refunds(pools, progress).await;
        self.settle_batch("Refunds Claimed", result)
    }

    pub async fn claim_rents(
        &self,
        pools: &[Pubkey],
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<BatchItem>, ClientError> {
        let result = self.sdk.claim_rents(pools, progress).await;
        self.settle_batch("Rent Claimed", result)
    }

    fn settle_batch(
        &self,
        title: &str,
        result: Result<Vec<BatchItem>, ClientError>,
    ) -> Result<Vec<BatchItem>, ClientError> {
        let items = self.reported(result)?;
        let mut succeeded = 0;
        for item in &items {
            match &item.outcome {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    self.notifications.report_error(e);
                }
            }
        }
        if succeeded > 0 {
            self.notifications
                .success(title, format!("{succeeded} of {} claims succeeded.", items.len()));
            self.queries.list_cache().invalidate(PoolList);
        }
        Ok(items)
    }
}

fn on_chain_address(pool: &PoolRecord) -> Result<Pubkey, ClientError> {
    let address = pool.pool_address.as_deref().ok_or_else(|| {
        ClientError::validation("Pool Not Ready", "This pool has not been confirmed on chain yet.")
    })?;
    Pubkey::from_str(address).map_err(|_| ClientError::InvalidResponse {
        resource: "pool".to_string(),
        reason: format!("poolAddress {address:?} is not a valid address"),
    })
}

fn ui_amount(native: u64, decimals: u8) -> f64 {
    // Decimal strings parse exactly to the nearest f64.
    format_amount(native, decimals).parse().unwrap_or(0.0)
}
