use anchor_lang::error::ERROR_CODE_OFFSET;
use anchor_lang::prelude::*;
use serde_json::Value;
use thiserror::Error;

/// Error table of the pool program. Variant order fixes the numeric code:
/// the first variant is 6000, the last is 6058.
#[error_code]
#[derive(PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Pool state
    #[msg("Invalid pool status for this operation")]
    InvalidPoolStatus,
    #[msg("Pool is already initialized")]
    AlreadyInitialized,
    #[msg("Pool has already ended")]
    AlreadyEnded,
    #[msg("Pool is paused")]
    Paused,
    #[msg("Pool token account is not empty")]
    PoolNotEmpty,
    #[msg("Pool has no participants")]
    NoParticipants,
    #[msg("No winner has been selected")]
    NoWinnerSelected,
    #[msg("Pool is full")]
    MaxParticipantsReached,
    #[msg("Too many participants")]
    TooManyParticipants,
    #[msg("Participant limit must be at least 2")]
    InvalidParticipantRange,

    // Validation
    #[msg("Invalid amount")]
    InvalidAmount,
    #[msg("Insufficient funds")]
    InsufficientFunds,
    #[msg("Arithmetic overflow")]
    Overflow,
    #[msg("Total fees exceed 100%")]
    ExcessiveFees,
    #[msg("Invalid token mint")]
    InvalidMint,
    #[msg("Unsupported token decimals")]
    InvalidDecimals,
    #[msg("Token has zero supply")]
    ZeroSupply,
    #[msg("Token mint has a freeze authority")]
    MintHasFreezeAuthority,
    #[msg("Token mint has a mint authority")]
    MintHasMintAuthority,
    #[msg("Invalid token program")]
    InvalidTokenProgram,
    #[msg("Pool configuration mismatch")]
    ConfigMismatch,
    #[msg("Pool token account mismatch")]
    PoolTokenMismatch,
    #[msg("Invalid participant token account")]
    InvalidParticipantToken,
    #[msg("Invalid participants account")]
    InvalidParticipantsPda,
    #[msg("Invalid winner account")]
    InvalidWinnerAccount,
    #[msg("Invalid lock duration")]
    InvalidLockDuration,
    #[msg("Lock duration cannot be decreased")]
    CannotDecreaseLockDuration,
    #[msg("Pool settings cannot change after someone joined")]
    CannotChangeAfterJoins,

    // Token-2022 extensions the program refuses
    #[msg("Tokens with transfer fees are not supported")]
    ForbiddenTransferFee,
    #[msg("Tokens with transfer hooks are not supported")]
    ForbiddenTransferHook,
    #[msg("Tokens with confidential transfers are not supported")]
    ForbiddenConfidentialTransfer,
    #[msg("Non-transferable tokens are not supported")]
    ForbiddenNonTransferable,
    #[msg("Interest-bearing tokens are not supported")]
    ForbiddenInterestBearing,
    #[msg("Tokens with a permanent delegate are not supported")]
    ForbiddenPermanentDelegate,
    #[msg("Tokens with a mint close authority are not supported")]
    ForbiddenMintCloseAuthority,
    #[msg("Tokens with a frozen default account state are not supported")]
    ForbiddenDefaultAccountState,

    // Randomness
    #[msg("Invalid randomness")]
    InvalidRandomness,
    #[msg("Invalid randomness account")]
    InvalidRandomnessAccount,
    #[msg("Randomness already requested")]
    RandomnessAlreadySet,
    #[msg("Randomness has not been requested")]
    RandomnessNotCommitted,
    #[msg("Randomness is not revealed yet")]
    RandomnessNotResolved,
    #[msg("Randomness request expired")]
    RandomnessExpired,

    // Timing
    #[msg("Pool has expired")]
    PoolExpired,
    #[msg("Pool has not expired yet")]
    PoolNotExpired,
    #[msg("Pool is still locked")]
    PoolStillLocked,
    #[msg("Too early for emergency action")]
    TooEarlyForEmergency,

    // Account state and authority
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Only the pool creator can do this")]
    NotCreator,
    #[msg("Only the developer wallet can do this")]
    NotDeveloper,
    #[msg("Wallet is not a participant of this pool")]
    NotParticipant,
    #[msg("Token account is frozen")]
    FrozenAccount,
    #[msg("Token account has a delegate")]
    HasDelegate,
    #[msg("Token account has a close authority")]
    HasCloseAuthority,
    #[msg("Account is not initialized")]
    UninitializedAccount,

    // Join and donate restrictions
    #[msg("Wallet already joined this pool")]
    AlreadyParticipated,
    #[msg("Pool is not open for joining")]
    PoolUnavailableForJoin,
    #[msg("Joining is closed once the pool is locked")]
    JoinClosedAfterUnlock,
    #[msg("Donations are closed for this pool")]
    DonateClosedAfterUnlock,
    #[msg("Pool balance does not match its accounting")]
    SpoofedDonation,
}

/// Numeric bands of the error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorBand {
    PoolState,
    Validation,
    TokenExtension,
    Randomness,
    Timing,
    AccountState,
    JoinDonate,
}

impl ErrorCode {
    pub const FIRST: u32 = ERROR_CODE_OFFSET;
    pub const LAST: u32 = ERROR_CODE_OFFSET + Self::ALL.len() as u32 - 1;

    /// Every variant, in code order.
    pub const ALL: [ErrorCode; 59] = [
        ErrorCode::InvalidPoolStatus,
        ErrorCode::AlreadyInitialized,
        ErrorCode::AlreadyEnded,
        ErrorCode::Paused,
        ErrorCode::PoolNotEmpty,
        ErrorCode::NoParticipants,
        ErrorCode::NoWinnerSelected,
        ErrorCode::MaxParticipantsReached,
        ErrorCode::TooManyParticipants,
        ErrorCode::InvalidParticipantRange,
        ErrorCode::InvalidAmount,
        ErrorCode::InsufficientFunds,
        ErrorCode::Overflow,
        ErrorCode::ExcessiveFees,
        ErrorCode::InvalidMint,
        ErrorCode::InvalidDecimals,
        ErrorCode::ZeroSupply,
        ErrorCode::MintHasFreezeAuthority,
        ErrorCode::MintHasMintAuthority,
        ErrorCode::InvalidTokenProgram,
        ErrorCode::ConfigMismatch,
        ErrorCode::PoolTokenMismatch,
        ErrorCode::InvalidParticipantToken,
        ErrorCode::InvalidParticipantsPda,
        ErrorCode::InvalidWinnerAccount,
        ErrorCode::InvalidLockDuration,
        ErrorCode::CannotDecreaseLockDuration,
        ErrorCode::CannotChangeAfterJoins,
        ErrorCode::ForbiddenTransferFee,
        ErrorCode::ForbiddenTransferHook,
        ErrorCode::ForbiddenConfidentialTransfer,
        ErrorCode::ForbiddenNonTransferable,
        ErrorCode::ForbiddenInterestBearing,
        ErrorCode::ForbiddenPermanentDelegate,
        ErrorCode::ForbiddenMintCloseAuthority,
        ErrorCode::ForbiddenDefaultAccountState,
        ErrorCode::InvalidRandomness,
        ErrorCode::InvalidRandomnessAccount,
        ErrorCode::RandomnessAlreadySet,
        ErrorCode::RandomnessNotCommitted,
        ErrorCode::RandomnessNotResolved,
        ErrorCode::RandomnessExpired,
        ErrorCode::PoolExpired,
        ErrorCode::PoolNotExpired,
        ErrorCode::PoolStillLocked,
        ErrorCode::TooEarlyForEmergency,
        ErrorCode::Unauthorized,
        ErrorCode::NotCreator,
        ErrorCode::NotDeveloper,
        ErrorCode::NotParticipant,
        ErrorCode::FrozenAccount,
        ErrorCode::HasDelegate,
        ErrorCode::HasCloseAuthority,
        ErrorCode::UninitializedAccount,
        ErrorCode::AlreadyParticipated,
        ErrorCode::PoolUnavailableForJoin,
        ErrorCode::JoinClosedAfterUnlock,
        ErrorCode::DonateClosedAfterUnlock,
        ErrorCode::SpoofedDonation,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        let index = code.checked_sub(ERROR_CODE_OFFSET)? as usize;
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.variant_name() == name)
    }

    pub fn code(self) -> u32 {
        u32::from(self)
    }

    /// Variant name as the program logs it after `Error Code:`.
    pub fn variant_name(self) -> String {
        format!("{self:?}")
    }

    pub fn band(self) -> ErrorBand {
        match self.code() - ERROR_CODE_OFFSET {
            0..=9 => ErrorBand::PoolState,
            10..=27 => ErrorBand::Validation,
            28..=35 => ErrorBand::TokenExtension,
            36..=41 => ErrorBand::Randomness,
            42..=45 => ErrorBand::Timing,
            46..=53 => ErrorBand::AccountState,
            _ => ErrorBand::JoinDonate,
        }
    }
}

/// A failure decoded to one entry of the program's error table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolProgramError {
    pub code: u32,
    pub error: ErrorCode,
    pub message: String,
}

impl PoolProgramError {
    pub fn name(&self) -> String {
        self.error.variant_name()
    }
}

impl From<ErrorCode> for PoolProgramError {
    fn from(error: ErrorCode) -> Self {
        Self {
            code: error.code(),
            error,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for PoolProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (error {})", self.message, self.code)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("wallet not connected")]
    Unauthenticated,

    #[error("Pool not found")]
    PoolNotFound,

    #[error("failed to fetch {resource}: HTTP {status}")]
    FetchFailed { resource: String, status: u16 },

    #[error("unexpected response from {resource}: {reason}")]
    InvalidResponse { resource: String, reason: String },

    #[error("{title}: {message}")]
    Validation { title: String, message: String },

    #[error("{0}")]
    Program(PoolProgramError),

    /// A transaction failure the classifier could not map to the error table.
    /// `raw` keeps the original error value for display and later inspection.
    #[error("transaction failed: {message}")]
    Transaction { message: String, raw: Value },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("development routes are disabled")]
    DevRoutesDisabled,

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },
}

impl ClientError {
    pub fn validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn transaction(message: impl Into<String>, raw: Value) -> Self {
        Self::Transaction {
            message: message.into(),
            raw,
        }
    }

    pub fn program_error(&self) -> Option<&PoolProgramError> {
        match self {
            Self::Program(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorCode> for ClientError {
    fn from(error: ErrorCode) -> Self {
        Self::Program(error.into())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_spans_6000_to_6058() {
        assert_eq!(ErrorCode::FIRST, 6000);
        assert_eq!(ErrorCode::LAST, 6058);
        for (i, error) in ErrorCode::ALL.iter().enumerate() {
            assert_eq!(error.code(), 6000 + i as u32, "{error:?}");
            assert_eq!(ErrorCode::from_code(error.code()), Some(*error));
        }
        assert_eq!(ErrorCode::from_code(5999), None);
        assert_eq!(ErrorCode::from_code(6059), None);
    }

    #[test]
    fn names_resolve_back_to_variants() {
        assert_eq!(
            ErrorCode::from_name("MaxParticipantsReached"),
            Some(ErrorCode::MaxParticipantsReached)
        );
        assert_eq!(ErrorCode::from_name("maxParticipantsReached"), None);
        assert_eq!(ErrorCode::from_name("NotAnError"), None);
    }

    #[test]
    fn bands_follow_code_ranges() {
        assert_eq!(ErrorCode::InvalidPoolStatus.band(), ErrorBand::PoolState);
        assert_eq!(ErrorCode::InvalidParticipantRange.band(), ErrorBand::PoolState);
        assert_eq!(ErrorCode::InvalidAmount.band(), ErrorBand::Validation);
        assert_eq!(ErrorCode::ForbiddenTransferHook.band(), ErrorBand::TokenExtension);
        assert_eq!(ErrorCode::RandomnessExpired.band(), ErrorBand::Randomness);
        assert_eq!(ErrorCode::PoolStillLocked.band(), ErrorBand::Timing);
        assert_eq!(ErrorCode::Unauthorized.band(), ErrorBand::AccountState);
        assert_eq!(ErrorCode::SpoofedDonation.band(), ErrorBand::JoinDonate);
    }

    #[test]
    fn program_error_carries_table_message() {
        let e = PoolProgramError::from(ErrorCode::Paused);
        assert_eq!(e.code, 6003);
        assert_eq!(e.message, "Pool is paused");
        assert_eq!(e.name(), "Paused");
    }
}
