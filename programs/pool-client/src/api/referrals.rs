use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use serde::Serialize;
use tracing::info;

use super::{checked, ApiClient};
use crate::error::ClientError;
use crate::records::ReferralResponse;
use crate::transport::{HttpRequest, Transport};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterReferral<'a> {
    wallet_address: &'a str,
    referrer_wallet: &'a str,
}

impl<T: Transport> ApiClient<T> {
    /// `POST /api/referrals/register`. Both wallets must be valid addresses and
    /// a wallet cannot refer itself.
    pub async fn register_referral(&self, wallet: &str, referrer: &str) -> Result<ReferralResponse, ClientError> {
        for address in [wallet, referrer] {
            Pubkey::from_str(address).map_err(|_| {
                ClientError::validation("Invalid Referral", format!("{address} is not a wallet address"))
            })?;
        }
        if wallet == referrer {
            return Err(ClientError::validation("Invalid Referral", "You cannot refer yourself"));
        }

        let body = Self::body(
            &RegisterReferral {
                wallet_address: wallet,
                referrer_wallet: referrer,
            },
            "referral",
        )?;
        let response = self
            .fetch(HttpRequest::post("/api/referrals/register", body), "referral")
            .await?;
        let registered: ReferralResponse = checked(response, "referral")?;
        info!(wallet, referrer, "referral registered");
        Ok(registered)
    }
}
