//! Token metadata lookups.
//!
//! Names and symbols come from the Metaplex metadata account of each mint.
//! Lookups go through a [`MetadataCache`] owned by the application and
//! passed in explicitly.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use anchor_lang::prelude::Pubkey;
use mpl_token_metadata::accounts::Metadata;
use solana_program::hash::{hash, Hash};
use tracing::debug;

use crate::constants::METADATA_CACHE_CAPACITY;
use crate::error::ClientError;
use crate::rpc::SolanaRpc;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl TokenMetadata {
    /// Decodes a metadata account. On-chain strings are padded with NULs.
    pub fn decode(data: &[u8]) -> Result<Self, ClientError> {
        let metadata = Metadata::safe_deserialize(data).map_err(|e| ClientError::Decode {
            what: "token metadata",
            reason: e.to_string(),
        })?;
        Ok(Self {
            mint: metadata.mint,
            name: unpad(&metadata.name),
            symbol: unpad(&metadata.symbol),
            uri: unpad(&metadata.uri),
        })
    }

    /// Symbol to show for the token, falling back to a shortened mint.
    pub fn display_symbol(&self) -> String {
        if self.symbol.is_empty() {
            short_address(&self.mint)
        } else {
            self.symbol.clone()
        }
    }
}

fn unpad(value: &str) -> String {
    value.replace('\u{0}', "").trim().to_string()
}

/// `ABCD...WXYZ`
pub fn short_address(address: &Pubkey) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..4], &full[full.len() - 4..])
}

pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Metadata::find_pda(mint).0
}

struct Lru {
    entries: HashMap<Hash, TokenMetadata>,
    order: VecDeque<Hash>,
}

impl Lru {
    fn touch(&mut self, key: &Hash) {
        if let Some(at) = self.order.iter().position(|k| k == key) {
            self.order.remove(at);
        }
        self.order.push_back(*key);
    }
}

/// Bounded metadata cache keyed by the hash of the mint address. The least
/// recently used entry is evicted once `capacity` is reached.
pub struct MetadataCache {
    capacity: usize,
    inner: Mutex<Lru>,
}

impl MetadataCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Lru {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn key(mint: &Pubkey) -> Hash {
        hash(mint.as_ref())
    }

    pub fn get(&self, mint: &Pubkey) -> Option<TokenMetadata> {
        let key = Self::key(mint);
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let found = lru.entries.get(&key).cloned();
        if found.is_some() {
            lru.touch(&key);
        }
        found
    }

    pub fn insert(&self, metadata: TokenMetadata) {
        let key = Self::key(&metadata.mint);
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !lru.entries.contains_key(&key) && lru.entries.len() >= self.capacity {
            if let Some(evicted) = lru.order.pop_front() {
                lru.entries.remove(&evicted);
            }
        }
        lru.entries.insert(key, metadata);
        lru.touch(&key);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut lru = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        lru.entries.clear();
        lru.order.clear();
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(METADATA_CACHE_CAPACITY)
    }
}

/// Resolves mint metadata over RPC through a shared cache.
pub struct MetadataResolver<'a, T> {
    rpc: &'a SolanaRpc<T>,
    cache: &'a MetadataCache,
}

impl<'a, T: Transport> MetadataResolver<'a, T> {
    pub fn new(rpc: &'a SolanaRpc<T>, cache: &'a MetadataCache) -> Self {
        Self { rpc, cache }
    }

    /// `None` when the mint has no metadata account.
    pub async fn resolve(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>, ClientError> {
        if let Some(hit) = self.cache.get(mint) {
            return Ok(Some(hit));
        }
        let address = metadata_address(mint);
        let Some(data) = self.rpc.account_data(&address).await? else {
            debug!(%mint, "mint has no metadata account");
            return Ok(None);
        };
        let metadata = TokenMetadata::decode(&data)?;
        debug!(%mint, symbol = %metadata.symbol, "resolved token metadata");
        self.cache.insert(metadata.clone());
        Ok(Some(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(mint: Pubkey, symbol: &str) -> TokenMetadata {
        TokenMetadata {
            mint,
            name: format!("{symbol} token"),
            symbol: symbol.to_string(),
            uri: String::new(),
        }
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = MetadataCache::new(2);
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        cache.insert(token(a, "A"));
        cache.insert(token(b, "B"));
        assert!(cache.get(&a).is_some());

        cache.insert(token(c, "C"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&b).is_none());
        assert_eq!(cache.get(&a).map(|m| m.symbol), Some("A".to_string()));
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn reinserting_does_not_evict() {
        let cache = MetadataCache::new(2);
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        cache.insert(token(a, "A"));
        cache.insert(token(b, "B"));
        cache.insert(token(a, "A2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&a).map(|m| m.symbol), Some("A2".to_string()));
        assert!(cache.get(&b).is_some());
    }

    #[test]
    fn strips_nul_padding() {
        assert_eq!(unpad("BONK\u{0}\u{0}\u{0}"), "BONK");
    }

    #[test]
    fn display_symbol_falls_back_to_mint() {
        let mint = Pubkey::new_unique();
        let full = mint.to_string();
        let shown = token(mint, "").display_symbol();
        assert!(shown.starts_with(&full[..4]));
        assert!(shown.ends_with(&full[full.len() - 4..]));
    }

    #[test]
    fn metadata_pda_uses_metaplex_seeds() {
        let mint = Pubkey::new_unique();
        let program = mpl_token_metadata::ID;
        let (expected, _) =
            Pubkey::find_program_address(&[b"metadata", program.as_ref(), mint.as_ref()], &program);
        assert_eq!(metadata_address(&mint), expected);
    }
}
