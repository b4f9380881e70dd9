use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ErrorBand, ErrorCode, PoolProgramError};

const CUSTOM_ERROR_MARKER: &str = "custom program error: 0x";
const ERROR_CODE_MARKER: &str = "Error Code: ";

/// Maps an opaque transaction failure onto the program's error table.
///
/// Extraction order: a numeric code carried by the value itself (`code`,
/// `error.errorCode.number`, `InstructionError: [_, { Custom }]`), then a
/// `custom program error: 0x…` pattern in its message or logs, then an
/// `Error Code: <Name>` pattern. Returns `None` when nothing in the
/// 6000..=6058 range is found.
pub fn classify(raw: &Value) -> Option<PoolProgramError> {
    if let Some(error) = direct_code(raw).and_then(ErrorCode::from_code) {
        return Some(error.into());
    }
    texts(raw).into_iter().find_map(classify_message)
}

/// Message-only variant of [`classify`].
pub fn classify_message(message: &str) -> Option<PoolProgramError> {
    hex_code(message)
        .and_then(ErrorCode::from_code)
        .or_else(|| named_code(message))
        .map(PoolProgramError::from)
}

fn direct_code(raw: &Value) -> Option<u32> {
    let candidates = [
        raw.as_u64(),
        raw.get("code").and_then(Value::as_u64),
        raw.pointer("/error/errorCode/number").and_then(Value::as_u64),
        raw.pointer("/InstructionError/1/Custom").and_then(Value::as_u64),
        raw.pointer("/err/InstructionError/1/Custom").and_then(Value::as_u64),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|code| u32::try_from(code).ok())
        .find(|code| (ErrorCode::FIRST..=ErrorCode::LAST).contains(code))
}

fn texts(raw: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    if let Some(s) = raw.as_str() {
        out.push(s);
    }
    for pointer in ["/message", "/error/message", "/error/errorMessage"] {
        if let Some(s) = raw.pointer(pointer).and_then(Value::as_str) {
            out.push(s);
        }
    }
    if let Some(logs) = raw.get("logs").and_then(Value::as_array) {
        out.extend(logs.iter().filter_map(Value::as_str));
    }
    out
}

fn hex_code(message: &str) -> Option<u32> {
    let lower = message.to_ascii_lowercase();
    let start = lower.find(CUSTOM_ERROR_MARKER)? + CUSTOM_ERROR_MARKER.len();
    let digits: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    u32::from_str_radix(&digits, 16).ok()
}

fn named_code(message: &str) -> Option<ErrorCode> {
    let start = message.find(ERROR_CODE_MARKER)? + ERROR_CODE_MARKER.len();
    let name: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let found = ErrorCode::from_name(&name);
    if found.is_none() {
        debug!(name, "error name not in program table");
    }
    found
}

fn classified_as(raw: &Value, codes: &[ErrorCode]) -> bool {
    classify(raw).is_some_and(|e| codes.contains(&e.error))
}

pub fn is_pool_full(raw: &Value) -> bool {
    classified_as(raw, &[ErrorCode::MaxParticipantsReached])
}

pub fn is_unauthorized(raw: &Value) -> bool {
    classified_as(
        raw,
        &[
            ErrorCode::Unauthorized,
            ErrorCode::NotCreator,
            ErrorCode::NotDeveloper,
            ErrorCode::NotParticipant,
        ],
    )
}

pub fn is_closed(raw: &Value) -> bool {
    classified_as(
        raw,
        &[
            ErrorCode::AlreadyEnded,
            ErrorCode::PoolExpired,
            ErrorCode::PoolUnavailableForJoin,
            ErrorCode::JoinClosedAfterUnlock,
            ErrorCode::DonateClosedAfterUnlock,
        ],
    )
}

pub fn is_randomness_error(raw: &Value) -> bool {
    classify(raw).is_some_and(|e| e.error.band() == ErrorBand::Randomness)
}

pub fn is_invalid_mint(raw: &Value) -> bool {
    classify(raw).is_some_and(|e| {
        e.error.band() == ErrorBand::TokenExtension
            || matches!(
                e.error,
                ErrorCode::InvalidMint
                    | ErrorCode::InvalidDecimals
                    | ErrorCode::ZeroSupply
                    | ErrorCode::MintHasFreezeAuthority
                    | ErrorCode::MintHasMintAuthority
            )
    })
}

pub fn is_paused(raw: &Value) -> bool {
    classified_as(raw, &[ErrorCode::Paused])
}

pub fn is_insufficient_funds(raw: &Value) -> bool {
    classified_as(raw, &[ErrorCode::InsufficientFunds])
}

impl ClientError {
    /// Upgrades an unclassified transaction failure to `Program` when its raw
    /// value or message decodes against the error table.
    pub fn classified(self) -> Self {
        match self {
            ClientError::Transaction { message, raw } => {
                match classify(&raw).or_else(|| classify_message(&message)) {
                    Some(decoded) => {
                        debug!(code = decoded.code, name = %decoded.name(), "classified program error");
                        ClientError::Program(decoded)
                    }
                    None => ClientError::Transaction { message, raw },
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_code_in_range_maps_to_its_table_entry() {
        for code in 6000..=6058u32 {
            let decoded = classify(&json!({ "code": code })).expect("in range");
            assert_eq!(decoded.code, code);
            assert_eq!(decoded.message, ErrorCode::from_code(code).unwrap().to_string());
        }
    }

    #[test]
    fn out_of_range_and_unrecognized_values_are_none() {
        assert_eq!(classify(&json!({ "code": 5999 })), None);
        assert_eq!(classify(&json!({ "code": 6059 })), None);
        assert_eq!(classify(&json!({ "code": -32002, "message": "Blockhash not found" })), None);
        assert_eq!(classify(&json!("User rejected the request.")), None);
        assert_eq!(classify(&json!({})), None);
        assert_eq!(classify(&Value::Null), None);
    }

    #[test]
    fn hex_custom_error_in_message() {
        let raw = json!({
            "message": "failed to send transaction: Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1777"
        });
        let decoded = classify(&raw).unwrap();
        assert_eq!(decoded.code, 0x1777);
        assert_eq!(decoded.error, ErrorCode::MaxParticipantsReached);
    }

    #[test]
    fn hex_custom_error_in_logs() {
        let raw = json!({
            "message": "Simulation failed",
            "logs": [
                "Program 53oTPbfy559uTaJQAbuWeAN1TyWXK1KfxUsM2GPJtrJw invoke [1]",
                "Program 53oTPbfy559uTaJQAbuWeAN1TyWXK1KfxUsM2GPJtrJw failed: custom program error: 0x1773"
            ]
        });
        assert_eq!(classify(&raw).unwrap().error, ErrorCode::Paused);
    }

    #[test]
    fn hex_outside_table_is_none() {
        assert_eq!(classify_message("custom program error: 0x1"), None);
        assert_eq!(classify_message("custom program error: 0x"), None);
    }

    #[test]
    fn anchor_error_code_name() {
        let message = "AnchorError occurred. Error Code: AlreadyParticipated. Error Number: 6054. Error Message: Wallet already joined this pool.";
        let decoded = classify_message(message).unwrap();
        assert_eq!(decoded.error, ErrorCode::AlreadyParticipated);
        assert_eq!(decoded.code, 6054);
        assert_eq!(classify_message("Error Code: SomethingElse."), None);
    }

    #[test]
    fn nested_shapes() {
        let anchor_js = json!({ "error": { "errorCode": { "code": "Paused", "number": 6003 } } });
        assert_eq!(classify(&anchor_js).unwrap().error, ErrorCode::Paused);

        let rpc_err = json!({ "InstructionError": [0, { "Custom": 6011 }] });
        assert_eq!(classify(&rpc_err).unwrap().error, ErrorCode::InsufficientFunds);
    }

    #[test]
    fn predicates() {
        assert!(is_pool_full(&json!({ "code": 6007 })));
        assert!(!is_pool_full(&json!({ "code": 6008 })));
        assert!(is_unauthorized(&json!({ "code": 6047 })));
        assert!(is_closed(&json!("Error Code: PoolExpired")));
        assert!(is_randomness_error(&json!({ "code": 6040 })));
        assert!(!is_randomness_error(&json!({ "code": 6042 })));
        assert!(is_invalid_mint(&json!({ "code": 6014 })));
        assert!(is_invalid_mint(&json!({ "code": 6029 })));
        assert!(is_paused(&json!({ "code": 6003 })));
        assert!(is_insufficient_funds(&json!({ "code": 6011 })));
        assert!(!is_insufficient_funds(&json!("network error")));
    }

    #[test]
    fn classified_upgrades_transaction_errors() {
        let err = ClientError::transaction("custom program error: 0x1770", Value::Null).classified();
        assert_eq!(err.program_error().unwrap().error, ErrorCode::InvalidPoolStatus);

        let err = ClientError::transaction("blockhash expired", Value::Null).classified();
        assert!(matches!(err, ClientError::Transaction { .. }));
    }
}
