use std::time::Duration;

/// Seed prefix of the pool PDA: `["pool", mint, salt]`.
pub const POOL_SEED: &[u8] = b"pool";

/// Seed prefix of the participants PDA: `["participants", pool]`.
pub const PARTICIPANTS_SEED: &[u8] = b"participants";

pub const MAX_PARTICIPANTS: usize = 20;
pub const MIN_PARTICIPANTS: u8 = 2;

/// Fees are expressed in basis points of the pot.
pub const MAX_FEE_BPS: u16 = 10_000;
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Minimum entry and donation, in whole tokens.
pub const MIN_BET_TOKENS: u64 = 20;
pub const MIN_DONATE_TOKENS: u64 = 20;

/// Mint decimals the program accepts for pool tokens.
pub const ALLOWED_DECIMALS: [u8; 4] = [6, 8, 9, 10];

/// Lock duration bounds, in seconds.
pub const MIN_LOCK_DURATION: i64 = 60;
pub const MAX_LOCK_DURATION: i64 = 43_200;

/// How long a pool accepts joins after creation (7 days).
pub const POOL_OPEN_DURATION: i64 = 604_800;

// Values of `Pool::status_reason`.
pub const REASON_EXPIRED: u8 = 1;
pub const REASON_PAUSED: u8 = 2;
pub const REASON_MAX_REACHED: u8 = 4;
pub const REASON_CANCELLED: u8 = 5;
pub const REASON_ADMIN_CLOSED: u8 = 6;

pub const POOL_LIST_POLL: Duration = Duration::from_secs(5);
pub const POOL_DETAIL_POLL: Duration = Duration::from_secs(2);

/// Detail cadence while a pool is waiting on randomness or winner selection.
pub const POOL_SETTLING_POLL: Duration = Duration::from_secs(1);

pub const WINNER_FEED_FALLBACK_POLL: Duration = Duration::from_secs(30);
pub const WINNER_FEED_CAP: usize = 15;

pub const BALANCE_FETCH_ATTEMPTS: u32 = 3;
pub const BALANCE_RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub const METADATA_CACHE_CAPACITY: usize = 256;
pub const MAX_NOTIFICATIONS: usize = 50;

/// Upload limit enforced before the request is sent (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
