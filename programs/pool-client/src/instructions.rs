use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::{hash, hashv};

use crate::constants::*;
use crate::error::{ClientError, ErrorCode};
use crate::state::min_native;

/// Arguments of the program's `create_pool` instruction, in wire order.
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatePoolArgs {
    pub salt: [u8; 32],
    pub max_participants: u8,
    pub lock_duration: i64,
    pub amount: u64,
    pub dev_wallet: Pubkey,
    pub dev_fee_bps: u16,
    pub burn_fee_bps: u16,
    pub treasury_wallet: Pubkey,
    pub treasury_fee_bps: u16,
    pub allow_mock: bool,
}

impl CreatePoolArgs {
    /// Checks the program runs on arguments alone, in the same order.
    pub fn validate(&self, decimals: u8) -> std::result::Result<(), ErrorCode> {
        let fees = self.dev_fee_bps as u32 + self.burn_fee_bps as u32 + self.treasury_fee_bps as u32;
        if fees > MAX_FEE_BPS as u32 {
            return Err(ErrorCode::ExcessiveFees);
        }
        if !ALLOWED_DECIMALS.contains(&decimals) {
            return Err(ErrorCode::InvalidDecimals);
        }
        if self.max_participants as usize > MAX_PARTICIPANTS {
            return Err(ErrorCode::TooManyParticipants);
        }
        if self.max_participants < MIN_PARTICIPANTS {
            return Err(ErrorCode::InvalidParticipantRange);
        }
        let min = min_native(MIN_BET_TOKENS, decimals).ok_or(ErrorCode::Overflow)?;
        if self.amount < min {
            return Err(ErrorCode::InvalidAmount);
        }
        if !(MIN_LOCK_DURATION..=MAX_LOCK_DURATION).contains(&self.lock_duration) {
            return Err(ErrorCode::InvalidLockDuration);
        }
        Ok(())
    }
}

/// Derives a fresh pool salt from the creator, mint and a caller nonce
/// (a timestamp is enough: the salt only has to be unique per mint).
pub fn derive_salt(creator: &Pubkey, mint: &Pubkey, nonce: u64) -> [u8; 32] {
    hashv(&[creator.as_ref(), mint.as_ref(), &nonce.to_le_bytes()]).to_bytes()
}

/// The program's entrypoints this client drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolInstruction {
    CreatePool { mint: Pubkey, args: CreatePoolArgs },
    SetLockDuration { pool: Pubkey, lock_duration: i64 },
    JoinPool { pool: Pubkey, amount: u64 },
    Donate { pool: Pubkey, amount: u64 },
    CancelPool { pool: Pubkey },
    ClaimRefund { pool: Pubkey },
    ClaimRent { pool: Pubkey },
    UnlockPool { pool: Pubkey },
    RequestRandomness { pool: Pubkey, randomness_account: Pubkey },
    SelectWinner { pool: Pubkey },
    PayoutWinner { pool: Pubkey },
}

impl PoolInstruction {
    /// Instruction name as declared in the program module.
    pub fn name(&self) -> &'static str {
        match self {
            PoolInstruction::CreatePool { .. } => "create_pool",
            PoolInstruction::SetLockDuration { .. } => "set_lock_duration",
            PoolInstruction::JoinPool { .. } => "join_pool",
            PoolInstruction::Donate { .. } => "donate",
            PoolInstruction::CancelPool { .. } => "cancel_pool",
            PoolInstruction::ClaimRefund { .. } => "claim_refund",
            PoolInstruction::ClaimRent { .. } => "claim_rent",
            PoolInstruction::UnlockPool { .. } => "unlock_pool",
            PoolInstruction::RequestRandomness { .. } => "request_randomness",
            PoolInstruction::SelectWinner { .. } => "select_winner",
            PoolInstruction::PayoutWinner { .. } => "payout_winner",
        }
    }

    /// Pool account the instruction targets. For `CreatePool` this is the PDA
    /// the program will initialize.
    pub fn pool(&self) -> Pubkey {
        match self {
            PoolInstruction::CreatePool { mint, args } => crate::state::Pool::address(mint, &args.salt).0,
            PoolInstruction::SetLockDuration { pool, .. }
            | PoolInstruction::JoinPool { pool, .. }
            | PoolInstruction::Donate { pool, .. }
            | PoolInstruction::CancelPool { pool }
            | PoolInstruction::ClaimRefund { pool }
            | PoolInstruction::ClaimRent { pool }
            | PoolInstruction::UnlockPool { pool }
            | PoolInstruction::RequestRandomness { pool, .. }
            | PoolInstruction::SelectWinner { pool }
            | PoolInstruction::PayoutWinner { pool } => *pool,
        }
    }

    /// Instruction data: `sha256("global:<name>")[..8]` followed by borsh args.
    pub fn data(&self) -> std::result::Result<Vec<u8>, ClientError> {
        let mut data = sighash(self.name()).to_vec();
        let encoded = match self {
            PoolInstruction::CreatePool { args, .. } => args.serialize(&mut data),
            PoolInstruction::SetLockDuration { lock_duration, .. } => lock_duration.serialize(&mut data),
            PoolInstruction::JoinPool { amount, .. } | PoolInstruction::Donate { amount, .. } => {
                amount.serialize(&mut data)
            }
            _ => Ok(()),
        };
        encoded.map_err(|e| ClientError::Encode {
            what: "instruction data",
            reason: e.to_string(),
        })?;
        Ok(data)
    }
}

pub fn sighash(name: &str) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash(format!("global:{name}").as_bytes()).to_bytes()[..8]);
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn args() -> CreatePoolArgs {
        CreatePoolArgs {
            salt: [9; 32],
            max_participants: 5,
            lock_duration: 600,
            amount: 20_000_000,
            dev_wallet: Pubkey::new_unique(),
            dev_fee_bps: 300,
            burn_fee_bps: 200,
            treasury_wallet: Pubkey::new_unique(),
            treasury_fee_bps: 100,
            allow_mock: false,
        }
    }

    #[test]
    fn validates_like_the_program() {
        assert_eq!(args().validate(6), Ok(()));
        assert_eq!(args().validate(7), Err(ErrorCode::InvalidDecimals));
        assert_eq!(args().validate(9), Err(ErrorCode::InvalidAmount));

        let mut a = args();
        a.dev_fee_bps = 9_901;
        assert_eq!(a.validate(6), Err(ErrorCode::ExcessiveFees));

        let mut a = args();
        a.max_participants = 21;
        assert_eq!(a.validate(6), Err(ErrorCode::TooManyParticipants));
        a.max_participants = 1;
        assert_eq!(a.validate(6), Err(ErrorCode::InvalidParticipantRange));

        let mut a = args();
        a.lock_duration = 59;
        assert_eq!(a.validate(6), Err(ErrorCode::InvalidLockDuration));
        a.lock_duration = MAX_LOCK_DURATION;
        assert_eq!(a.validate(6), Ok(()));
    }

    #[test]
    fn join_data_is_sighash_then_amount() {
        let ix = PoolInstruction::JoinPool {
            pool: Pubkey::new_unique(),
            amount: 20_000_000,
        };
        let data = ix.data().unwrap();
        assert_eq!(&data[..8], &hash(b"global:join_pool").to_bytes()[..8]);
        assert_eq!(&data[8..], &20_000_000u64.to_le_bytes());
    }

    #[test]
    fn set_lock_duration_carries_signed_seconds() {
        let ix = PoolInstruction::SetLockDuration {
            pool: Pubkey::new_unique(),
            lock_duration: 900,
        };
        let data = ix.data().unwrap();
        assert_eq!(&data[..8], &sighash("set_lock_duration"));
        assert_eq!(&data[8..], &900i64.to_le_bytes());
    }

    #[test]
    fn argless_instructions_are_just_the_sighash() {
        let ix = PoolInstruction::SelectWinner { pool: Pubkey::new_unique() };
        assert_eq!(ix.data().unwrap(), sighash("select_winner").to_vec());
    }

    #[test]
    fn create_pool_targets_its_pda() {
        let mint = Pubkey::new_unique();
        let a = args();
        let ix = PoolInstruction::CreatePool { mint, args: a.clone() };
        let (expected, _) =
            Pubkey::find_program_address(&[b"pool", mint.as_ref(), a.salt.as_ref()], &crate::ID);
        assert_eq!(ix.pool(), expected);

        let data = ix.data().unwrap();
        let decoded = CreatePoolArgs::deserialize(&mut &data[8..]).unwrap();
        assert_eq!(decoded, a);
    }

    #[test]
    fn salts_differ_per_nonce() {
        let creator = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_ne!(derive_salt(&creator, &mint, 1), derive_salt(&creator, &mint, 2));
    }
}
