//! Client for the pooled-prize lottery program and its companion backend.
//!
//! The on-chain program itself lives elsewhere; this crate mirrors its public
//! surface (error table, event layouts, account layouts, instruction encoding)
//! and wraps the REST/WebSocket backend the web app talks to.

use anchor_lang::prelude::*;

/// Action boundary: local validation, program call, backend record, notification.
pub mod actions;

/// REST endpoints of the backend (pools, winners feed, leaderboards, referrals, uploads).
pub mod api;

/// Decoding raw transaction failures into program error codes.
pub mod classifier;

/// Environment-driven configuration and tracing setup.
pub mod config;

/// Program-wide constants: seeds, limits, fee denominators, poll cadence.
pub mod constants;

/// Program error table and the client error type.
pub mod error;

/// Program events and `Program data:` log decoding.
pub mod events;

/// Live winners feed over WebSocket with polling fallback.
pub mod feed;

/// Instruction encoding and argument checks for the program's entrypoints.
pub mod instructions;

/// Token metadata lookups and the application-scoped metadata cache.
pub mod metadata;

/// Client-only notification queue and toasts.
pub mod notify;

/// Query cache and pollers for pool data.
pub mod query;

/// Backend record shapes.
pub mod records;

/// Solana JSON-RPC reads: balances, pool accounts.
pub mod rpc;

/// Wallet-gated wrapper over the program client.
pub mod sdk;

/// On-chain account mirrors, including the `Pool` account.
pub mod state;

/// HTTP transport seam.
pub mod transport;

/// Local input validation run before any network call.
pub mod validate;

declare_id!("53oTPbfy559uTaJQAbuWeAN1TyWXK1KfxUsM2GPJtrJw");

pub use classifier::{classify, classify_message};
pub use error::{ClientError, ErrorCode, PoolProgramError};
pub use events::PoolEvent;
pub use sdk::{PoolProgram, PoolSdk, WalletSession};
pub use state::{Pool, PoolStatus};
