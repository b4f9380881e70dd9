//! Polled, invalidatable copies of backend data.
//!
//! Every fetch takes a ticket from the cache before the request goes out.
//! A response is stored only if its ticket is newer than both the stored
//! value and the last invalidation, so a slow response to an earlier request
//! never overwrites a newer one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::constants::*;
use crate::error::ClientError;
use crate::records::*;
use crate::transport::Transport;

/// Issued when a fetch starts; orders responses by request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: Option<V>,
    seq: u64,
    floor: u64,
    stale: bool,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            value: None,
            seq: 0,
            floor: 0,
            stale: true,
        }
    }
}

pub struct QueryCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    issued: AtomicU64,
    invalidations: AtomicU64,
    notify: broadcast::Sender<K>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(HashMap::new()),
            issued: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            notify,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Stores `value` if `ticket` is newer than what the key already holds.
    /// Returns whether the value was kept.
    pub fn store(&self, key: K, ticket: Ticket, value: V) -> bool {
        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_default();
        if ticket.0 <= entry.seq || ticket.0 <= entry.floor {
            debug!(?key, ticket = ticket.0, stored = entry.seq, "dropping out-of-order response");
            return false;
        }
        entry.value = Some(value);
        entry.seq = ticket.0;
        entry.stale = false;
        true
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries().get(key).and_then(|e| e.value.clone())
    }

    pub fn is_stale(&self, key: &K) -> bool {
        self.entries().get(key).map_or(true, |e| e.stale)
    }

    /// Marks `key` stale, rejects responses to requests already in flight,
    /// and wakes any poller watching it.
    pub fn invalidate(&self, key: K) {
        let floor = self.issued.load(Ordering::SeqCst);
        {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();
            entry.stale = true;
            entry.floor = floor;
        }
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        debug!(?key, "query invalidated");
        // No receivers just means nothing is polling this cache right now.
        let _ = self.notify.send(key);
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<K> {
        self.notify.subscribe()
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Aborts its poller when dropped.
#[derive(Debug)]
pub struct PollHandle(JoinHandle<()>);

impl PollHandle {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Key of the single pool-list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolList;

/// Pool list and per-pool detail queries with the mutations that invalidate them.
pub struct PoolQueries<T> {
    api: Arc<ApiClient<T>>,
    list: QueryCache<PoolList, Vec<PoolRecord>>,
    detail: QueryCache<String, PoolDetail>,
}

impl<T: Transport> PoolQueries<T> {
    pub fn new(api: Arc<ApiClient<T>>) -> Self {
        Self {
            api,
            list: QueryCache::new(),
            detail: QueryCache::new(),
        }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn list_cache(&self) -> &QueryCache<PoolList, Vec<PoolRecord>> {
        &self.list
    }

    pub fn detail_cache(&self) -> &QueryCache<String, PoolDetail> {
        &self.detail
    }

    /// Last stored pool list, in server order.
    pub fn pools(&self) -> Option<Vec<PoolRecord>> {
        self.list.get(&PoolList)
    }

    pub fn pool(&self, id: &str) -> Option<PoolDetail> {
        self.detail.get(&id.to_string())
    }

    pub async fn refresh_pools(&self) -> Result<Vec<PoolRecord>, ClientError> {
        let ticket = self.list.ticket();
        let pools = self.api.list_pools().await?;
        self.list.store(PoolList, ticket, pools.clone());
        Ok(pools)
    }

    pub async fn refresh_pool(&self, id: &str) -> Result<PoolDetail, ClientError> {
        let ticket = self.detail.ticket();
        let detail = self.api.get_pool(id).await?;
        self.detail.store(id.to_string(), ticket, detail.clone());
        Ok(detail)
    }

    fn invalidate_pool(&self, id: &str) {
        self.list.invalidate(PoolList);
        self.detail.invalidate(id.to_string());
    }

    pub async fn create_pool(&self, request: &CreatePoolRequest) -> Result<PoolMutationResponse, ClientError> {
        let created = self.api.create_pool(request).await?;
        self.invalidate_pool(&created.pool.id);
        Ok(created)
    }

    pub async fn update_pool(&self, id: &str, request: &UpdatePoolRequest) -> Result<PoolMutationResponse, ClientError> {
        let updated = self.api.update_pool(id, request).await?;
        self.invalidate_pool(id);
        Ok(updated)
    }

    pub async fn join_pool(&self, id: &str, request: &JoinPoolRequest) -> Result<JoinPoolResponse, ClientError> {
        let joined = self.api.join_pool(id, request).await?;
        self.invalidate_pool(id);
        Ok(joined)
    }

    pub async fn donate(&self, id: &str, request: &DonateRequest) -> Result<DonateResponse, ClientError> {
        let donated = self.api.donate(id, request).await?;
        self.invalidate_pool(id);
        Ok(donated)
    }

    pub async fn trigger_winner(&self, id: &str) -> Result<TriggerWinnerResponse, ClientError> {
        let triggered = self.api.trigger_winner(id).await?;
        self.invalidate_pool(id);
        Ok(triggered)
    }
}

impl<T: Transport> PoolQueries<T> {
    /// Polls the list every [`POOL_LIST_POLL`], and immediately after it is
    /// invalidated.
    pub fn spawn_list_poller(self: &Arc<Self>) -> PollHandle {
        let queries = Arc::clone(self);
        let mut invalidated = self.list.subscribe();
        PollHandle::new(tokio::spawn(async move {
            loop {
                if let Err(e) = queries.refresh_pools().await {
                    warn!(error = %e, "pool list poll failed");
                }
                tokio::select! {
                    _ = tokio::time::sleep(POOL_LIST_POLL) => {}
                    woke = invalidated.recv() => {
                        if let Err(broadcast::error::RecvError::Closed) = woke {
                            return;
                        }
                    }
                }
            }
        }))
    }

    /// Polls one pool's detail every [`POOL_DETAIL_POLL`], or every
    /// [`POOL_SETTLING_POLL`] while the pool waits on winner selection.
    pub fn spawn_detail_poller(self: &Arc<Self>, id: impl Into<String>) -> PollHandle {
        let queries = Arc::clone(self);
        let id = id.into();
        let mut invalidated = self.detail.subscribe();
        PollHandle::new(tokio::spawn(async move {
            loop {
                let period = match queries.refresh_pool(&id).await {
                    Ok(detail) => detail_period(&detail),
                    Err(e) => {
                        warn!(pool = %id, error = %e, "pool detail poll failed");
                        POOL_DETAIL_POLL
                    }
                };
                let deadline = tokio::time::sleep(period);
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        _ = &mut deadline => break,
                        woke = invalidated.recv() => match woke {
                            Ok(key) if key == id => break,
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                            Err(broadcast::error::RecvError::Closed) => return,
                        },
                    }
                }
            }
        }))
    }
}

fn detail_period(detail: &PoolDetail) -> Duration {
    match detail.pool.pool_status() {
        Some(status) if status.is_settling() => POOL_SETTLING_POLL,
        _ => POOL_DETAIL_POLL,
    }
}
