use chrono::{DateTime, Duration, Utc};
use coin_model::{CoinId, CoinSnapshot, HistoricalSeries, PricePoint};
use log::debug;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::error::{ApiError, Operation};

const COINGECKO_BASE_API_URL: &str = "https://api.coingecko.com/api/v3";
const HISTORY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct CoinJSON {
    name: String,
    symbol: String,
    market_data: MarketDataJSON,
}

#[derive(Debug, Deserialize)]
struct MarketDataJSON {
    current_price: CurrencyAmountJSON,
    price_change_percentage_24h: f64,
    market_cap: MarketCapJSON,
}

#[derive(Debug, Deserialize)]
struct CurrencyAmountJSON {
    eur: f64,
    usd: f64,
}

#[derive(Debug, Deserialize)]
struct MarketCapJSON {
    eur: f64,
}

#[derive(Debug, Deserialize)]
struct MarketChartJSON {
    prices: Vec<(i64, f64)>,
}

/// Unix-second bounds of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// Trailing history window ending at `now`.
pub fn time_range(now: DateTime<Utc>) -> TimeRange {
    TimeRange {
        start: (now - Duration::days(HISTORY_WINDOW_DAYS)).timestamp(),
        end: now.timestamp(),
    }
}

#[derive(Clone)]
pub struct CoinGeckoAPI {
    base_url: String,
    client: reqwest::Client,
    headers: HeaderMap,
}

impl Default for CoinGeckoAPI {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoAPI {
    pub fn new() -> Self {
        Self::with_base_url(COINGECKO_BASE_API_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("coin_dashboard/", env!("CARGO_PKG_VERSION"))),
        );

        CoinGeckoAPI {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            headers,
        }
    }

    pub async fn fetch_snapshot(&self, coin: CoinId) -> Result<CoinSnapshot, ApiError> {
        let url = format!("{}/coins/{}", self.base_url, coin);

        debug!("fetch_snapshot | url: {}", url);

        let body = self.get_body(&url, Operation::Snapshot, coin).await?;
        parse_snapshot(coin, &body)
    }

    pub async fn fetch_history(&self, coin: CoinId) -> Result<HistoricalSeries, ApiError> {
        let timerange = time_range(Utc::now());
        let url = format!(
            "{}/coins/{}/market_chart/range?vs_currency=eur&from={}&to={}",
            self.base_url, coin, timerange.start, timerange.end
        );

        debug!("fetch_history | url: {}", url);

        let body = self.get_body(&url, Operation::History, coin).await?;
        parse_history(coin, &body)
    }

    async fn get_body(
        &self,
        url: &str,
        operation: Operation,
        coin: CoinId,
    ) -> Result<String, ApiError> {
        let transport = |source| ApiError::Transport {
            operation,
            coin,
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("get_body | status: {} | url: {}", status, url);
            return Err(ApiError::Status {
                operation,
                coin,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}

/// Converts a `/coins/{id}` body into a snapshot.
pub fn parse_snapshot(coin: CoinId, body: &str) -> Result<CoinSnapshot, ApiError> {
    let json: CoinJSON = serde_json::from_str(body).map_err(|e| ApiError::Payload {
        operation: Operation::Snapshot,
        coin,
        reason: e.to_string(),
    })?;

    Ok(CoinSnapshot {
        id: coin,
        name: json.name,
        symbol: json.symbol,
        price_eur: json.market_data.current_price.eur,
        price_usd: json.market_data.current_price.usd,
        change_24h_pct: json.market_data.price_change_percentage_24h,
        market_cap_eur: json.market_data.market_cap.eur,
    })
}

/// Converts a `market_chart/range` body into an ascending series.
pub fn parse_history(coin: CoinId, body: &str) -> Result<HistoricalSeries, ApiError> {
    let payload_error = |reason: String| ApiError::Payload {
        operation: Operation::History,
        coin,
        reason,
    };

    let json: MarketChartJSON =
        serde_json::from_str(body).map_err(|e| payload_error(e.to_string()))?;

    let mut history = json
        .prices
        .into_iter()
        .map(|(millis, price_eur)| {
            DateTime::from_timestamp_millis(millis)
                .map(|timestamp| PricePoint {
                    timestamp,
                    price_eur,
                })
                .ok_or_else(|| payload_error(format!("invalid timestamp {}", millis)))
        })
        .collect::<Result<HistoricalSeries, ApiError>>()?;

    history.sort_by_key(|point| point.timestamp);

    Ok(history)
}
