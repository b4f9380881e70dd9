//! Input checks run before any network call.
//!
//! Amounts are parsed from decimal strings straight into native units so no
//! floating point rounding ever reaches a transaction.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;

use crate::constants::MIN_DONATE_TOKENS;
use crate::error::ClientError;
use crate::state::min_native;

pub const INVALID_AMOUNT: &str = "Invalid Amount";
pub const INSUFFICIENT_BALANCE: &str = "Insufficient Balance";
pub const INVALID_WALLET: &str = "Invalid Wallet";

fn invalid_amount(message: impl Into<String>) -> ClientError {
    ClientError::validation(INVALID_AMOUNT, message)
}

/// Parses a positive decimal amount such as `"20"` or `"0.5"` into native
/// units for a mint with `decimals`.
pub fn parse_amount(input: &str, decimals: u8) -> Result<u64, ClientError> {
    let input = input.trim();
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction) {
        return Err(invalid_amount("Enter a number, for example 25 or 0.5."));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid_amount(format!("At most {decimals} decimal places are supported.")));
    }

    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| invalid_amount("Unsupported token decimals."))?;
    let too_large = || invalid_amount("Amount is too large.");
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| too_large())? };
    let padded = format!("{fraction:0<width$}", width = decimals as usize);
    let fraction: u64 = if padded.is_empty() { 0 } else { padded.parse().map_err(|_| too_large())? };

    let native = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(too_large)?;
    if native == 0 {
        return Err(invalid_amount("Enter an amount greater than zero."));
    }
    Ok(native)
}

/// Native units back to a decimal string without trailing zeros.
pub fn format_amount(native: u64, decimals: u8) -> String {
    // Past 38 decimals every u64 amount is below one whole token.
    let (whole, fraction) = match 10u128.checked_pow(decimals as u32) {
        Some(scale) => (native as u128 / scale, native as u128 % scale),
        None => (0, native as u128),
    };
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0>width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

pub fn check_balance(amount: u64, balance: u64, decimals: u8) -> Result<(), ClientError> {
    if amount > balance {
        return Err(ClientError::validation(
            INSUFFICIENT_BALANCE,
            format!(
                "You need {} but only have {}.",
                format_amount(amount, decimals),
                format_amount(balance, decimals)
            ),
        ));
    }
    Ok(())
}

/// Parses a donation and applies the program's minimum.
pub fn validate_donation(input: &str, decimals: u8) -> Result<u64, ClientError> {
    let amount = parse_amount(input, decimals)?;
    let min = min_native(MIN_DONATE_TOKENS, decimals).ok_or_else(|| invalid_amount("Unsupported token decimals."))?;
    if amount < min {
        return Err(invalid_amount(format!("Minimum donation is {MIN_DONATE_TOKENS} tokens.")));
    }
    Ok(amount)
}

pub fn parse_wallet(input: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(input.trim())
        .map_err(|_| ClientError::validation(INVALID_WALLET, format!("{input:?} is not a valid address.")))
}
