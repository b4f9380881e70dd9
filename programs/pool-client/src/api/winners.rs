use super::ApiClient;
use crate::error::ClientError;
use crate::records::{Listing, WinnerFeedEntry};
use crate::transport::Transport;

impl<T: Transport> ApiClient<T> {
    /// `GET /api/winners/feed`, newest first.
    pub async fn winners_feed(&self) -> Result<Vec<WinnerFeedEntry>, ClientError> {
        let listing: Listing<WinnerFeedEntry> =
            self.get_json("/api/winners/feed".to_string(), "winners feed").await?;
        Ok(listing.into_vec())
    }
}
