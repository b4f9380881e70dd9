//! Backend record shapes (camelCase JSON).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::PoolStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub id: String,
    /// On-chain address; `None` until the creation transaction is confirmed.
    #[serde(default)]
    pub pool_address: Option<String>,
    pub status: String,
    pub mint: String,
    pub token_symbol: String,
    pub entry_amount: f64,
    pub current_participants: u32,
    pub max_participants: u32,
    pub creator_wallet: String,
    pub created_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub winner_wallet: Option<String>,
    #[serde(default)]
    pub randomness_account: Option<String>,
    #[serde(default)]
    pub randomness_requested: bool,
}

impl PoolRecord {
    pub fn pool_status(&self) -> Option<PoolStatus> {
        PoolStatus::parse(&self.status)
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    /// Lists the record invariants this row breaks. The client never rewrites
    /// backend data; violations are only reported.
    pub fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.current_participants > self.max_participants {
            out.push("currentParticipants exceeds maxParticipants");
        }
        if self.winner_wallet.is_some() && !self.pool_status().is_some_and(PoolStatus::winner_decided) {
            out.push("winnerWallet set before winner selection");
        }
        out
    }

    pub(crate) fn warn_on_violations(&self) {
        for violation in self.violations() {
            warn!(pool = %self.id, status = %self.status, violation, "pool record breaks invariant");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub pool_id: String,
    pub wallet_address: String,
    pub joined_at: String,
    #[serde(default)]
    pub refund_claimed: bool,
    #[serde(default)]
    pub refund_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDetail {
    pub pool: PoolRecord,
    #[serde(default)]
    pub participants: Vec<ParticipantRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub pool_id: String,
    pub wallet_address: String,
    pub amount: f64,
    #[serde(default)]
    pub tx_signature: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerFeedEntry {
    pub id: String,
    pub pool_id: String,
    pub winner_wallet: String,
    pub amount: f64,
    pub token_symbol: String,
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub tx_signature: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub wallet_address: String,
    pub value: f64,
    #[serde(default)]
    pub count: Option<u32>,
}

/// List endpoints answer either with a bare array or with the array wrapped
/// under a named key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "pools", alias = "entries", alias = "winners", alias = "items")]
        data: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

// Request bodies.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub pool_address: Option<String>,
    pub mint: String,
    pub token_symbol: String,
    pub entry_amount: f64,
    pub max_participants: u32,
    pub lock_duration: i64,
    pub creator_wallet: String,
    pub tx_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPoolRequest {
    pub wallet_address: String,
    pub tx_signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateRequest {
    pub wallet_address: String,
    pub amount: f64,
    pub tx_signature: String,
}

// Mutation responses.

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMutationResponse {
    pub success: bool,
    pub pool: PoolRecord,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPoolResponse {
    pub success: bool,
    pub participant: ParticipantRecord,
    #[serde(default)]
    pub current_participants: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateResponse {
    pub success: bool,
    pub donation: DonationRecord,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerWinnerResponse {
    pub success: bool,
    pub winner_wallet: String,
    #[serde(default)]
    pub tx_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
}

/// Fixed-schema check run on every mutation response after it deserialized.
pub trait ResponseSchema {
    fn check(&self) -> Result<(), String>;
}

fn require_success(success: bool) -> Result<(), String> {
    if success {
        Ok(())
    } else {
        Err("success flag is false".to_string())
    }
}

impl ResponseSchema for PoolMutationResponse {
    fn check(&self) -> Result<(), String> {
        require_success(self.success)?;
        if self.pool.id.is_empty() {
            return Err("pool.id is empty".to_string());
        }
        Ok(())
    }
}

impl ResponseSchema for JoinPoolResponse {
    fn check(&self) -> Result<(), String> {
        require_success(self.success)?;
        if self.participant.wallet_address.is_empty() {
            return Err("participant.walletAddress is empty".to_string());
        }
        Ok(())
    }
}

impl ResponseSchema for DonateResponse {
    fn check(&self) -> Result<(), String> {
        require_success(self.success)?;
        if !(self.donation.amount.is_finite() && self.donation.amount > 0.0) {
            return Err("donation.amount is not positive".to_string());
        }
        Ok(())
    }
}

impl ResponseSchema for TriggerWinnerResponse {
    fn check(&self) -> Result<(), String> {
        require_success(self.success)?;
        if self.winner_wallet.is_empty() {
            return Err("winnerWallet is empty".to_string());
        }
        Ok(())
    }
}

impl ResponseSchema for ReferralResponse {
    fn check(&self) -> Result<(), String> {
        require_success(self.success)
    }
}

impl ResponseSchema for UploadResponse {
    fn check(&self) -> Result<(), String> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(())
        } else {
            Err(format!("url {:?} is not absolute", self.url))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Value};

    pub(crate) fn pool_json(id: &str, current: u32, max: u32) -> Value {
        json!({
            "id": id,
            "poolAddress": null,
            "status": "open",
            "mint": "So11111111111111111111111111111111111111112",
            "tokenSymbol": "BONK",
            "entryAmount": 20.0,
            "currentParticipants": current,
            "maxParticipants": max,
            "creatorWallet": "4Nd1mYQbJ8fKkP2ZQ6jWQ2b1GvF5ryhXbUXbVY6C2DzV",
            "createdAt": "2026-01-02T03:04:05Z",
            "expiresAt": "2026-01-09T03:04:05Z",
            "winnerWallet": null,
            "randomnessAccount": null,
            "randomnessRequested": false
        })
    }

    #[test]
    fn pool_record_from_backend_json() {
        let record: PoolRecord = serde_json::from_value(pool_json("p1", 3, 5)).unwrap();
        assert_eq!(record.pool_status(), Some(PoolStatus::Open));
        assert!(!record.is_full());
        assert!(record.violations().is_empty());
    }

    #[test]
    fn optional_fields_default() {
        let mut value = pool_json("p1", 0, 2);
        let map = value.as_object_mut().unwrap();
        map.remove("poolAddress");
        map.remove("randomnessRequested");
        let record: PoolRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.pool_address, None);
        assert!(!record.randomness_requested);
    }

    #[test]
    fn violations_are_reported_not_fixed() {
        let mut record: PoolRecord = serde_json::from_value(pool_json("p1", 6, 5)).unwrap();
        record.winner_wallet = Some("W".into());
        assert_eq!(record.violations().len(), 2);
        assert_eq!(record.current_participants, 6);

        record.status = "winner_selected".into();
        record.current_participants = 5;
        assert!(record.violations().is_empty());

        record.status = "cancelled".into();
        assert_eq!(record.violations(), vec!["winnerWallet set before winner selection"]);
    }

    #[test]
    fn listings_accept_bare_and_wrapped() {
        let bare: Listing<u32> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);
        let wrapped: Listing<u32> = serde_json::from_value(json!({ "pools": [3] })).unwrap();
        assert_eq!(wrapped.into_vec(), vec![3]);
        let entries: Listing<u32> = serde_json::from_value(json!({ "entries": [4] })).unwrap();
        assert_eq!(entries.into_vec(), vec![4]);
    }

    #[test]
    fn schema_rejects_unsuccessful_mutations() {
        let response: JoinPoolResponse = serde_json::from_value(json!({
            "success": false,
            "participant": {
                "poolId": "p1",
                "walletAddress": "w",
                "joinedAt": "2026-01-01T00:00:00Z"
            }
        }))
        .unwrap();
        assert!(response.check().is_err());
    }
}
