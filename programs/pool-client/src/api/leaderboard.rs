use std::fmt;

use super::ApiClient;
use crate::error::ClientError;
use crate::records::{LeaderboardEntry, Listing};
use crate::transport::Transport;

/// Boards served under `/api/leaderboard/:kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardKind {
    Winners,
    Creators,
    Donors,
    Referrers,
}

impl LeaderboardKind {
    pub fn slug(self) -> &'static str {
        match self {
            LeaderboardKind::Winners => "winners",
            LeaderboardKind::Creators => "creators",
            LeaderboardKind::Donors => "donors",
            LeaderboardKind::Referrers => "referrers",
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl<T: Transport> ApiClient<T> {
    pub async fn leaderboard(&self, kind: LeaderboardKind) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let listing: Listing<LeaderboardEntry> = self
            .get_json(format!("/api/leaderboard/{kind}"), "leaderboard")
            .await?;
        let mut entries = listing.into_vec();
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }
}
