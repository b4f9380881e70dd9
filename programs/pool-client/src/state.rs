use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::ErrorCode;

/// Mirror of the program's `Pool` account.
#[account]
#[derive(InitSpace, Debug)]
pub struct Pool {
    /// Numeric id derived from the creation salt, slot and creator.
    pub pool_id: u64,

    /// Creator-chosen salt; part of the PDA seeds.
    pub salt: [u8; 32],

    pub mint: Pubkey,

    /// Token account owned by the pool PDA that holds the pot.
    pub pool_token: Pubkey,

    pub creator: Pubkey,

    pub start_time: i64,
    pub duration: i64,
    pub expire_time: i64,
    pub end_time: i64,
    pub unlock_time: i64,
    pub close_time: i64,

    pub max_participants: u8,

    /// Seconds the pool stays locked once full.
    pub lock_duration: i64,

    /// UNIX timestamp the lock started, `0` while the pool is open.
    pub lock_start_time: i64,

    /// Exact entry amount in native units.
    pub amount: u64,

    /// Current pot: entries plus donations.
    pub total_amount: u64,
    pub total_volume: u64,
    pub total_joins: u32,
    pub total_donations: u32,

    pub dev_wallet: Pubkey,
    pub dev_fee_bps: u16,
    pub burn_fee_bps: u16,
    pub treasury_wallet: Pubkey,
    pub treasury_fee_bps: u16,

    /// Revealed randomness, zero until revealed.
    pub randomness: u128,

    /// Switchboard randomness account committed for this pool.
    pub randomness_account: Pubkey,
    pub randomness_deadline_slot: u64,

    pub bump: u8,
    pub status: PoolStatus,
    pub paused: bool,
    pub version: u8,
    pub schema: u8,

    /// sha256 over the creation parameters, checked on every join/donate.
    pub config_hash: [u8; 32],
    pub allow_mock: bool,
    pub randomness_commit_slot: u64,
    pub initialized: bool,
    pub last_join_time: i64,

    /// One of the `REASON_*` constants.
    pub status_reason: u8,
    pub participants_account: Pubkey,

    /// Default pubkey until a winner is selected.
    pub winner: Pubkey,
}

/// Mirror of the program's `Participants` account.
#[account]
#[derive(InitSpace, Debug)]
pub struct Participants {
    pub list: [Pubkey; MAX_PARTICIPANTS],
    pub count: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Hash, InitSpace, Debug)]
#[repr(u8)]
pub enum PoolStatus {
    Open = 0,
    Locked = 1,
    Unlocked = 2,
    RandomnessCommitted = 3,
    RandomnessRevealed = 4,
    WinnerSelected = 5,
    Ended = 6,
    Cancelled = 7,
    Closed = 8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
#[repr(u8)]
pub enum ActionType {
    Created = 0,
    Joined = 1,
    Donated = 2,
    Closed = 3,
    Ended = 5,
    Cancelled = 6,
    RandomnessCommitted = 8,
    RandomnessMockCommitted = 9,
    ReachedMax = 10,
    Unlocked = 11,
    AdminClosed = 12,
    EmergencyReveal = 13,
    Expired = 14,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug)]
#[repr(u8)]
pub enum HintType {
    ReachedMax = 1,
    NearExpire = 3,
    Unlocked = 4,
}

impl PoolStatus {
    pub const ALL: [PoolStatus; 9] = [
        PoolStatus::Open,
        PoolStatus::Locked,
        PoolStatus::Unlocked,
        PoolStatus::RandomnessCommitted,
        PoolStatus::RandomnessRevealed,
        PoolStatus::WinnerSelected,
        PoolStatus::Ended,
        PoolStatus::Cancelled,
        PoolStatus::Closed,
    ];

    /// Status string used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            PoolStatus::Open => "open",
            PoolStatus::Locked => "locked",
            PoolStatus::Unlocked => "unlocked",
            PoolStatus::RandomnessCommitted => "randomness_committed",
            PoolStatus::RandomnessRevealed => "randomness_revealed",
            PoolStatus::WinnerSelected => "winner_selected",
            PoolStatus::Ended => "ended",
            PoolStatus::Cancelled => "cancelled",
            PoolStatus::Closed => "closed",
        }
    }

    /// Accepts snake_case, camelCase and PascalCase spellings.
    pub fn parse(status: &str) -> Option<Self> {
        let folded: String = status
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().replace('_', "") == folded)
    }

    /// No further state changes are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, PoolStatus::Ended | PoolStatus::Cancelled | PoolStatus::Closed)
    }

    /// Winner selection has happened. This includes `WinnerSelected`, which
    /// precedes the terminal `Ended` by one payout and already carries the
    /// winner on the backend record.
    pub fn winner_decided(self) -> bool {
        matches!(
            self,
            PoolStatus::WinnerSelected | PoolStatus::Ended | PoolStatus::Closed
        )
    }

    /// Between unlock and winner selection; the detail view polls faster here.
    pub fn is_settling(self) -> bool {
        matches!(
            self,
            PoolStatus::Unlocked | PoolStatus::RandomnessCommitted | PoolStatus::RandomnessRevealed
        )
    }
}

/// How the pot is split on payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutBreakdown {
    pub winner_amount: u64,
    pub dev_amount: u64,
    pub burn_amount: u64,
    pub treasury_amount: u64,
}

impl Pool {
    pub const LEN: usize = 8 + Pool::INIT_SPACE;

    /// PDA of the pool for `mint` and `salt`.
    pub fn address(mint: &Pubkey, salt: &[u8; 32]) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[POOL_SEED, mint.as_ref(), salt.as_ref()], &crate::ID)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.start_time + self.duration
    }

    pub fn is_active(&self, now: i64) -> bool {
        self.status == PoolStatus::Open && !self.paused && !self.is_expired(now)
    }

    pub fn is_locked(&self, now: i64) -> bool {
        self.lock_start_time != 0 && now >= self.lock_start_time
    }

    pub fn can_join(&self, now: i64) -> bool {
        self.is_active(now) && !self.is_locked(now)
    }

    pub fn has_winner(&self) -> bool {
        self.winner != Pubkey::default()
    }

    /// Runs the program's join gates in the program's order, returning the
    /// error it would raise.
    pub fn check_join(&self, now: i64, amount: u64) -> std::result::Result<(), ErrorCode> {
        if !self.initialized {
            return Err(ErrorCode::UninitializedAccount);
        }
        if self.paused {
            return Err(ErrorCode::Paused);
        }
        if self.is_expired(now) {
            return Err(ErrorCode::PoolExpired);
        }
        if self.status != PoolStatus::Open {
            return Err(ErrorCode::PoolUnavailableForJoin);
        }
        if self.lock_start_time != 0 {
            return Err(ErrorCode::JoinClosedAfterUnlock);
        }
        if amount != self.amount {
            return Err(ErrorCode::InvalidAmount);
        }
        Ok(())
    }

    /// Donations are accepted while open, and while locked until the lock runs out.
    pub fn check_donate(&self, now: i64) -> std::result::Result<(), ErrorCode> {
        if !self.initialized {
            return Err(ErrorCode::UninitializedAccount);
        }
        if self.paused {
            return Err(ErrorCode::Paused);
        }
        if matches!(self.status, PoolStatus::Unlocked | PoolStatus::Ended) {
            return Err(ErrorCode::DonateClosedAfterUnlock);
        }
        match self.status {
            PoolStatus::Open if self.is_expired(now) => Err(ErrorCode::PoolExpired),
            PoolStatus::Open => Ok(()),
            PoolStatus::Locked if now < self.lock_start_time + self.lock_duration => Ok(()),
            _ => Err(ErrorCode::DonateClosedAfterUnlock),
        }
    }

    /// Gates of `set_lock_duration`: only the creator, only while open and
    /// before anyone but the creator joined, and never shorter.
    pub fn check_set_lock_duration(
        &self,
        signer: &Pubkey,
        lock_duration: i64,
        participant_count: u8,
    ) -> std::result::Result<(), ErrorCode> {
        if self.paused {
            return Err(ErrorCode::Paused);
        }
        if *signer != self.creator {
            return Err(ErrorCode::NotCreator);
        }
        if self.status != PoolStatus::Open {
            return Err(ErrorCode::InvalidPoolStatus);
        }
        if !(MIN_LOCK_DURATION..=MAX_LOCK_DURATION).contains(&lock_duration) {
            return Err(ErrorCode::InvalidLockDuration);
        }
        if lock_duration < self.lock_duration {
            return Err(ErrorCode::CannotDecreaseLockDuration);
        }
        if participant_count != 1 {
            return Err(ErrorCode::CannotChangeAfterJoins);
        }
        Ok(())
    }

    pub fn unlocks_at(&self) -> Option<i64> {
        (self.lock_start_time != 0).then(|| self.lock_start_time + self.lock_duration)
    }

    pub fn payout_breakdown(&self) -> std::result::Result<PayoutBreakdown, ErrorCode> {
        payout_breakdown(
            self.total_amount,
            self.dev_fee_bps,
            self.burn_fee_bps,
            self.treasury_fee_bps,
        )
    }
}

/// Splits `total` by basis points; the winner receives the remainder.
pub fn payout_breakdown(
    total: u64,
    dev_fee_bps: u16,
    burn_fee_bps: u16,
    treasury_fee_bps: u16,
) -> std::result::Result<PayoutBreakdown, ErrorCode> {
    let share = |bps: u16| -> std::result::Result<u64, ErrorCode> {
        Ok(total.checked_mul(bps as u64).ok_or(ErrorCode::Overflow)? / FEE_DENOMINATOR)
    };
    let dev_amount = share(dev_fee_bps)?;
    let burn_amount = share(burn_fee_bps)?;
    let treasury_amount = share(treasury_fee_bps)?;
    let paid = dev_amount
        .checked_add(burn_amount)
        .and_then(|v| v.checked_add(treasury_amount))
        .ok_or(ErrorCode::Overflow)?;
    let winner_amount = total.checked_sub(paid).ok_or(ErrorCode::Overflow)?;
    Ok(PayoutBreakdown {
        winner_amount,
        dev_amount,
        burn_amount,
        treasury_amount,
    })
}

/// `tokens` whole tokens in native units for a mint with `decimals`.
pub fn min_native(tokens: u64, decimals: u8) -> Option<u64> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|scale| tokens.checked_mul(scale))
}

impl Participants {
    pub fn address(pool: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[PARTICIPANTS_SEED, pool.as_ref()], &crate::ID)
    }

    /// The filled prefix of `list`.
    pub fn active(&self) -> &[Pubkey] {
        let count = (self.count as usize).min(MAX_PARTICIPANTS);
        &self.list[..count]
    }

    pub fn contains(&self, wallet: &Pubkey) -> bool {
        self.active().contains(wallet)
    }
}
