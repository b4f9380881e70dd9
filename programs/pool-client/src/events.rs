//! Events the pool program emits with `emit!`.
//!
//! Each event is logged as `Program data: <base64>` where the payload is the
//! 8-byte discriminator (`sha256("event:<Name>")[..8]`) followed by the
//! borsh-encoded fields. Decoded events are for display only; the backend
//! remains the source of truth for pool state.

use anchor_lang::prelude::*;
use anchor_lang::Discriminator;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::error::ClientError;
use crate::state::{ActionType, HintType, PoolStatus};

pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStateEvent {
    pub pool_id: Pubkey,
    pub numerical_pool_id: u64,
    pub status: PoolStatus,
    pub participant_count: u8,
    pub total_amount: u64,
    pub status_reason: u8,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct PoolActivityEvent {
    pub pool_id: Pubkey,
    pub numerical_pool_id: u64,
    pub action: ActionType,
    pub amount: u64,
    pub participant_rank: u8,
    pub dev_fee_percent: u16,
    pub burn_fee_percent: u16,
    pub treasury_fee_percent: u16,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct UIHint {
    pub pool_id: Pubkey,
    pub hint: HintType,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct RefundBurned {
    pub user: Pubkey,
    pub amount: u64,
    pub reason: u8,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct RentClaimed {
    pub pool_id: Pubkey,
    pub caller: Pubkey,
    pub sent_to: Pubkey,
    pub timestamp: i64,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerSelectedEvent {
    pub pool_id: Pubkey,
    pub numerical_pool_id: u64,
    pub winner: Pubkey,
    pub winner_amount: u64,
    pub dev_amount: u64,
    pub burn_amount: u64,
    pub treasury_amount: u64,
    pub randomness: u128,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct RefundClaimedEvent {
    pub pool_id: Pubkey,
    pub user: Pubkey,
    pub amount: u64,
    pub burn_amount: u64,
    pub reason: u8,
}

#[event]
#[derive(Debug, Clone, PartialEq)]
pub struct ForfeitedToTreasury {
    pub pool_id: Pubkey,
    pub amount: u64,
}

/// Any event the program emits, or raw bytes under an unknown discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    PoolState(PoolStateEvent),
    PoolActivity(PoolActivityEvent),
    UiHint(UIHint),
    RefundBurned(RefundBurned),
    RentClaimed(RentClaimed),
    WinnerSelected(WinnerSelectedEvent),
    RefundClaimed(RefundClaimedEvent),
    ForfeitedToTreasury(ForfeitedToTreasury),
    Unrecognized { discriminator: [u8; 8], data: Vec<u8> },
}

fn body<T: AnchorDeserialize>(mut payload: &[u8], what: &'static str) -> std::result::Result<T, ClientError> {
    T::deserialize(&mut payload).map_err(|e| ClientError::Decode {
        what,
        reason: e.to_string(),
    })
}

fn is<T: Discriminator>(discriminator: &[u8]) -> bool {
    discriminator == &T::DISCRIMINATOR[..]
}

impl PoolEvent {
    /// Decodes discriminator + borsh payload.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, ClientError> {
        if bytes.len() < 8 {
            return Err(ClientError::Decode {
                what: "event",
                reason: format!("{} bytes is shorter than a discriminator", bytes.len()),
            });
        }
        let (disc, payload) = bytes.split_at(8);
        let event = if is::<PoolStateEvent>(disc) {
            PoolEvent::PoolState(body(payload, "PoolStateEvent")?)
        } else if is::<PoolActivityEvent>(disc) {
            PoolEvent::PoolActivity(body(payload, "PoolActivityEvent")?)
        } else if is::<UIHint>(disc) {
            PoolEvent::UiHint(body(payload, "UIHint")?)
        } else if is::<RefundBurned>(disc) {
            PoolEvent::RefundBurned(body(payload, "RefundBurned")?)
        } else if is::<RentClaimed>(disc) {
            PoolEvent::RentClaimed(body(payload, "RentClaimed")?)
        } else if is::<WinnerSelectedEvent>(disc) {
            PoolEvent::WinnerSelected(body(payload, "WinnerSelectedEvent")?)
        } else if is::<RefundClaimedEvent>(disc) {
            PoolEvent::RefundClaimed(body(payload, "RefundClaimedEvent")?)
        } else if is::<ForfeitedToTreasury>(disc) {
            PoolEvent::ForfeitedToTreasury(body(payload, "ForfeitedToTreasury")?)
        } else {
            let mut discriminator = [0u8; 8];
            discriminator.copy_from_slice(disc);
            PoolEvent::Unrecognized {
                discriminator,
                data: payload.to_vec(),
            }
        };
        Ok(event)
    }

    /// Decodes one `Program data: <base64>` log line. Other lines yield `None`.
    pub fn from_log(line: &str) -> Option<std::result::Result<Self, ClientError>> {
        let encoded = line.strip_prefix(PROGRAM_DATA_PREFIX)?;
        Some(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| ClientError::Decode {
                    what: "program data",
                    reason: e.to_string(),
                })
                .and_then(|bytes| Self::decode(&bytes)),
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::PoolState(_) => "PoolStateEvent",
            PoolEvent::PoolActivity(_) => "PoolActivityEvent",
            PoolEvent::UiHint(_) => "UIHint",
            PoolEvent::RefundBurned(_) => "RefundBurned",
            PoolEvent::RentClaimed(_) => "RentClaimed",
            PoolEvent::WinnerSelected(_) => "WinnerSelectedEvent",
            PoolEvent::RefundClaimed(_) => "RefundClaimedEvent",
            PoolEvent::ForfeitedToTreasury(_) => "ForfeitedToTreasury",
            PoolEvent::Unrecognized { .. } => "Unrecognized",
        }
    }

    /// Pool account the event refers to, when it carries one.
    pub fn pool(&self) -> Option<Pubkey> {
        match self {
            PoolEvent::PoolState(e) => Some(e.pool_id),
            PoolEvent::PoolActivity(e) => Some(e.pool_id),
            PoolEvent::UiHint(e) => Some(e.pool_id),
            PoolEvent::RentClaimed(e) => Some(e.pool_id),
            PoolEvent::WinnerSelected(e) => Some(e.pool_id),
            PoolEvent::RefundClaimed(e) => Some(e.pool_id),
            PoolEvent::ForfeitedToTreasury(e) => Some(e.pool_id),
            PoolEvent::RefundBurned(_) | PoolEvent::Unrecognized { .. } => None,
        }
    }
}

/// Decodes every program-data line of a transaction's logs, in order.
/// Lines that fail to decode are logged and skipped.
pub fn parse_logs<S: AsRef<str>>(logs: &[S]) -> Vec<PoolEvent> {
    logs.iter()
        .filter_map(|line| PoolEvent::from_log(line.as_ref()))
        .filter_map(|decoded| match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "skipping undecodable program data");
                None
            }
        })
        .collect()
}
