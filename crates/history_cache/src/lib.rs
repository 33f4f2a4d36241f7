//! In-memory refresh cache for historical price series.
//!
//! Each coin has its own slot. A slot is served as long as it is younger than
//! the TTL; after that the next read goes back to the source.

use chrono::{DateTime, Duration, Utc};
use coin_model::{CoinId, HistoricalSeries};
use coingecko_api::{ApiError, CoinGeckoAPI};
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_TTL_MINUTES: i64 = 30;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Anything that can produce a fresh history for a coin.
pub trait HistorySource {
    type Error;

    fn fetch_history(
        &self,
        coin: CoinId,
    ) -> impl Future<Output = Result<HistoricalSeries, Self::Error>>;
}

impl HistorySource for CoinGeckoAPI {
    type Error = ApiError;

    async fn fetch_history(&self, coin: CoinId) -> Result<HistoricalSeries, ApiError> {
        CoinGeckoAPI::fetch_history(self, coin).await
    }
}

#[derive(Debug, Clone)]
pub struct CachedFetch {
    pub series: Arc<HistoricalSeries>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedFetch {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.fetched_at >= now - ttl
    }
}

pub struct HistoryCache<C: Clock> {
    clock: C,
    ttl: Duration,
    entries: HashMap<CoinId, CachedFetch>,
}

impl<C: Clock> HistoryCache<C> {
    pub fn new(clock: C) -> Self {
        Self::with_ttl(clock, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn with_ttl(clock: C, ttl: Duration) -> Self {
        HistoryCache {
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<S: HistorySource>(
        &mut self,
        coin: CoinId,
        source: &S,
    ) -> Result<Arc<HistoricalSeries>, S::Error> {
        let now = self.clock.now();
        self.get_at(coin, now, source).await
    }

    /// Returns the cached series for `coin`, refetching when the slot is
    /// missing or older than `now - ttl`. Failed fetches leave the slot as is.
    pub async fn get_at<S: HistorySource>(
        &mut self,
        coin: CoinId,
        now: DateTime<Utc>,
        source: &S,
    ) -> Result<Arc<HistoricalSeries>, S::Error> {
        if let Some(entry) = self.entries.get(&coin) {
            if entry.is_fresh(now, self.ttl) {
                debug!("get_at | cache hit | coin: {}", coin);
                return Ok(Arc::clone(&entry.series));
            }
            debug!("get_at | cache stale | coin: {} | fetched_at: {}", coin, entry.fetched_at);
        } else {
            debug!("get_at | cache miss | coin: {}", coin);
        }

        let series = Arc::new(source.fetch_history(coin).await?);

        debug!("get_at | saving to cache | coin: {} | points: {}", coin, series.len());
        self.entries.insert(
            coin,
            CachedFetch {
                series: Arc::clone(&series),
                fetched_at: now,
            },
        );

        Ok(series)
    }

    pub fn entry(&self, coin: CoinId) -> Option<&CachedFetch> {
        self.entries.get(&coin)
    }

    pub fn invalidate(&mut self, coin: CoinId) -> bool {
        self.entries.remove(&coin).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
