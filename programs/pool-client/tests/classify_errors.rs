use pool_client::classifier::*;
use pool_client::{classify, classify_message, ErrorCode};
use serde_json::json;

#[test]
fn every_program_code_classifies_to_its_table_entry() {
    for error in ErrorCode::ALL {
        let decoded = classify(&json!({ "code": error.code() })).unwrap();
        assert_eq!(decoded.error, error);
        assert_eq!(decoded.message, error.to_string());
        assert_eq!(decoded.name(), format!("{error:?}"));
    }
}

#[test]
fn unrecognized_errors_are_none() {
    assert!(classify(&json!({ "code": 5999 })).is_none());
    assert!(classify(&json!({ "code": 6059 })).is_none());
    assert!(classify(&json!({ "message": "User rejected the request." })).is_none());
    assert!(classify(&json!(null)).is_none());
    assert!(classify_message("Error Code: SomethingElse").is_none());
}

#[test]
fn nested_and_textual_shapes() {
    let anchor = json!({ "error": { "errorCode": { "code": "Paused", "number": 6003 } } });
    assert_eq!(classify(&anchor).map(|e| e.error), Some(ErrorCode::Paused));

    let logs = json!({
        "message": "Transaction simulation failed",
        "logs": ["Program log: Instruction: JoinPool", "Program failed: custom program error: 0x1777"]
    });
    assert_eq!(classify(&logs).map(|e| e.code), Some(0x1777));

    let named = "AnchorError caused by account: pool. Error Code: PoolExpired. Error Number: 6042.";
    assert_eq!(classify_message(named).map(|e| e.error), Some(ErrorCode::PoolExpired));
}

#[test]
fn predicates_compose_on_classification() {
    assert!(is_pool_full(&json!({ "code": ErrorCode::MaxParticipantsReached.code() })));
    assert!(is_unauthorized(&json!({ "code": ErrorCode::NotCreator.code() })));
    assert!(is_closed(&json!({ "code": ErrorCode::JoinClosedAfterUnlock.code() })));
    assert!(is_randomness_error(&json!({ "code": ErrorCode::RandomnessExpired.code() })));
    assert!(is_invalid_mint(&json!({ "code": ErrorCode::ForbiddenTransferHook.code() })));
    assert!(is_paused(&json!({ "code": ErrorCode::Paused.code() })));
    assert!(is_insufficient_funds(&json!({ "code": ErrorCode::InsufficientFunds.code() })));

    let unrelated = json!({ "message": "timeout" });
    assert!(!is_pool_full(&unrelated));
    assert!(!is_paused(&unrelated));
}
