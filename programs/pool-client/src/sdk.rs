//! Wallet-gated wrapper over the program client.
//!
//! Building, signing and sending transactions belongs to an injected
//! [`PoolProgram`]. This layer checks the wallet session, runs the argument
//! checks the program would run, and maps raw failures through the error
//! classifier.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use anchor_lang::prelude::Pubkey;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::instructions::{CreatePoolArgs, PoolInstruction};

/// Base58 transaction signature.
pub type Signature = String;

/// Sends one instruction signed by `signer` and returns the confirmed
/// signature. Failures should be [`ClientError::Transaction`] carrying the
/// raw error so they can be classified.
pub trait PoolProgram: Send + Sync {
    fn execute(
        &self,
        signer: Pubkey,
        instruction: PoolInstruction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send;
}

impl<P: PoolProgram> PoolProgram for Arc<P> {
    fn execute(
        &self,
        signer: Pubkey,
        instruction: PoolInstruction,
    ) -> impl Future<Output = Result<Signature, ClientError>> + Send {
        (**self).execute(signer, instruction)
    }
}

/// Connected wallet, shared between the SDK and whatever drives connection.
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    wallet: Arc<RwLock<Option<Pubkey>>>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(wallet: Pubkey) -> Self {
        let session = Self::new();
        session.connect(wallet);
        session
    }

    pub fn connect(&self, wallet: Pubkey) {
        *self.wallet.write().unwrap_or_else(PoisonError::into_inner) = Some(wallet);
        info!(%wallet, "wallet connected");
    }

    pub fn disconnect(&self) {
        *self.wallet.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("wallet disconnected");
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        *self.wallet.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.pubkey().is_some()
    }

    fn require(&self) -> Result<Pubkey, ClientError> {
        self.pubkey().ok_or(ClientError::Unauthenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPool {
    pub signature: Signature,
    /// PDA `["pool", mint, salt]`.
    pub pool: Pubkey,
}

/// Outcome of one item of a batch claim.
#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub pool: Pubkey,
    pub outcome: Result<Signature, ClientError>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Called once per batch item, after the item settles.
pub type Progress<'a> = &'a mut (dyn FnMut(&BatchItem) + Send);

pub struct PoolSdk<P> {
    program: P,
    session: WalletSession,
}

impl<P: PoolProgram> PoolSdk<P> {
    pub fn new(program: P, session: WalletSession) -> Self {
        Self { program, session }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    async fn send(&self, signer: Pubkey, instruction: PoolInstruction) -> Result<Signature, ClientError> {
        let name = instruction.name();
        let pool = instruction.pool();
        debug!(instruction = name, %pool, %signer, "sending instruction");
        match self.program.execute(signer, instruction).await {
            Ok(signature) => {
                info!(instruction = name, %pool, %signature, "instruction confirmed");
                Ok(signature)
            }
            Err(e) => {
                let e = e.classified();
                warn!(instruction = name, %pool, error = %e, "instruction failed");
                Err(e)
            }
        }
    }

    async fn call(&self, instruction: PoolInstruction) -> Result<Signature, ClientError> {
        let signer = self.session.require()?;
        self.send(signer, instruction).await
    }

    /// Creates a pool after running the program's argument checks locally.
    pub async fn create_pool(
        &self,
        mint: Pubkey,
        args: CreatePoolArgs,
        decimals: u8,
    ) -> Result<CreatedPool, ClientError> {
        let signer = self.session.require()?;
        args.validate(decimals)?;
        let instruction = PoolInstruction::CreatePool { mint, args };
        let pool = instruction.pool();
        let signature = self.send(signer, instruction).await?;
        Ok(CreatedPool { signature, pool })
    }

    /// Extends the lock of a pool the wallet created. Only allowed before
    /// anyone else joined.
    pub async fn set_lock_duration(&self, pool: Pubkey, lock_duration: i64) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::SetLockDuration { pool, lock_duration }).await
    }

    pub async fn join_pool(&self, pool: Pubkey, amount: u64) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::JoinPool { pool, amount }).await
    }

    pub async fn donate(&self, pool: Pubkey, amount: u64) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::Donate { pool, amount }).await
    }

    pub async fn cancel_pool(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::CancelPool { pool }).await
    }

    pub async fn claim_refund(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::ClaimRefund { pool }).await
    }

    pub async fn claim_rent(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::ClaimRent { pool }).await
    }

    pub async fn unlock_pool(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::UnlockPool { pool }).await
    }

    pub async fn request_randomness(
        &self,
        pool: Pubkey,
        randomness_account: Pubkey,
    ) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::RequestRandomness {
            pool,
            randomness_account,
        })
        .await
    }

    pub async fn select_winner(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::SelectWinner { pool }).await
    }

    pub async fn payout_winner(&self, pool: Pubkey) -> Result<Signature, ClientError> {
        self.call(PoolInstruction::PayoutWinner { pool }).await
    }

    /// Claims refunds from each pool in order. A failing item does not stop
    /// the batch; every item gets a record, in input order.
    pub async fn claim_refunds(
        &self,
        pools: &[Pubkey],
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<BatchItem>, ClientError> {
        self.batch(pools, progress, |pool| PoolInstruction::ClaimRefund { pool })
            .await
    }

    /// Claims rent from each pool in order, with the same semantics as
    /// [`claim_refunds`](Self::claim_refunds).
    pub async fn claim_rents(
        &self,
        pools: &[Pubkey],
        progress: Option<Progress<'_>>,
    ) -> Result<Vec<BatchItem>, ClientError> {
        self.batch(pools, progress, |pool| PoolInstruction::ClaimRent { pool })
            .await
    }

    async fn batch(
        &self,
        pools: &[Pubkey],
        mut progress: Option<Progress<'_>>,
        instruction: fn(Pubkey) -> PoolInstruction,
    ) -> Result<Vec<BatchItem>, ClientError> {
        let signer = self.session.require()?;
        let mut items = Vec::with_capacity(pools.len());
        for (index, pool) in pools.iter().copied().enumerate() {
            let outcome = self.send(signer, instruction(pool)).await;
            let item = BatchItem { index, pool, outcome };
            if let Some(report) = progress.as_mut() {
                report(&item);
            }
            items.push(item);
        }
        let failed = items.iter().filter(|item| !item.is_ok()).count();
        info!(total = items.len(), failed, "batch claim finished");
        Ok(items)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::ErrorCode;

    /// Records every instruction and fails the ones whose pool is listed.
    #[derive(Default)]
    pub(crate) struct RecordingProgram {
        pub(crate) sent: Mutex<Vec<PoolInstruction>>,
        pub(crate) failing: Vec<Pubkey>,
    }

    impl PoolProgram for RecordingProgram {
        async fn execute(&self, _signer: Pubkey, instruction: PoolInstruction) -> Result<Signature, ClientError> {
            let pool = instruction.pool();
            let n = {
                let mut sent = self.sent.lock().unwrap();
                sent.push(instruction);
                sent.len()
            };
            if self.failing.contains(&pool) {
                Err(ClientError::transaction(
                    "simulation failed",
                    json!({ "InstructionError": [0, { "Custom": 6044 }] }),
                ))
            } else {
                Ok(format!("sig{n}"))
            }
        }
    }

    #[tokio::test]
    async fn disconnected_wallet_makes_no_call() {
        let sdk = PoolSdk::new(RecordingProgram::default(), WalletSession::new());
        let err = sdk.join_pool(Pubkey::new_unique(), 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
        let err = sdk.claim_refunds(&[Pubkey::new_unique()], None).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
        assert!(sdk.program().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_pool_returns_its_pda() {
        let sdk = PoolSdk::new(RecordingProgram::default(), WalletSession::connected(Pubkey::new_unique()));
        let mint = Pubkey::new_unique();
        let args = CreatePoolArgs {
            salt: [3; 32],
            max_participants: 4,
            lock_duration: 120,
            amount: 20_000_000,
            dev_wallet: Pubkey::new_unique(),
            dev_fee_bps: 100,
            burn_fee_bps: 0,
            treasury_wallet: Pubkey::new_unique(),
            treasury_fee_bps: 0,
            allow_mock: false,
        };
        let created = sdk.create_pool(mint, args.clone(), 6).await.unwrap();
        assert_eq!(created.pool, crate::state::Pool::address(&mint, &args.salt).0);
        assert_eq!(created.signature, "sig1");

        let err = sdk.create_pool(mint, args, 7).await.unwrap_err();
        assert_eq!(err.program_error().map(|e| e.error), Some(ErrorCode::InvalidDecimals));
        assert_eq!(sdk.program().sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_lock_duration_sends_to_the_pool() {
        let sdk = PoolSdk::new(RecordingProgram::default(), WalletSession::connected(Pubkey::new_unique()));
        let pool = Pubkey::new_unique();
        assert_eq!(sdk.set_lock_duration(pool, 900).await.unwrap(), "sig1");
        assert_eq!(
            sdk.program().sent.lock().unwrap().as_slice(),
            &[PoolInstruction::SetLockDuration { pool, lock_duration: 900 }]
        );
    }

    #[tokio::test]
    async fn program_failures_are_classified() {
        let pool = Pubkey::new_unique();
        let program = RecordingProgram {
            failing: vec![pool],
            ..Default::default()
        };
        let sdk = PoolSdk::new(program, WalletSession::connected(Pubkey::new_unique()));
        let err = sdk.unlock_pool(pool).await.unwrap_err();
        assert_eq!(err.program_error().map(|e| e.error), Some(ErrorCode::PoolStillLocked));
    }

    #[tokio::test]
    async fn batch_reports_every_item_in_order() {
        let pools: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let program = RecordingProgram {
            failing: vec![pools[2]],
            ..Default::default()
        };
        let sdk = PoolSdk::new(program, WalletSession::connected(Pubkey::new_unique()));

        let mut seen = Vec::new();
        let mut record = |item: &BatchItem| seen.push((item.index, item.is_ok()));
        let items = sdk.claim_rents(&pools, Some(&mut record)).await.unwrap();

        assert_eq!(seen, vec![(0, true), (1, true), (2, false), (3, true)]);
        assert_eq!(items.len(), 4);
        assert_eq!(items.iter().filter(|i| !i.is_ok()).count(), 1);
        assert_eq!(items[2].pool, pools[2]);
        assert_eq!(items[3].outcome.as_deref().ok(), Some("sig4"));
    }
}
