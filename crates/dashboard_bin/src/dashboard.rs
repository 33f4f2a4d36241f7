//! Selection handling and view-model assembly for the dashboard page.
//!
//! A request goes through three steps: [`Selection::from_query`] normalises
//! the form, [`load`] talks to the upstream API and the history cache, and
//! [`build_view`] turns the results into something the HTML renderer can
//! print without further decisions.

use chrono::{DateTime, Utc};
use coin_model::{CoinId, CoinSnapshot, HistoricalSeries, IndicatedPoint, PortfolioHolding};
use coingecko_api::{ApiError, CoinGeckoAPI};
use history_cache::{Clock, HistoryCache};
use log::{debug, error};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::utils::{format_amount, format_change, parse_quantity, sanitize_coin_id};

pub const UNAVAILABLE_MESSAGE: &str =
    "Error: Unable to fetch cryptocurrency data. Please try again later.";

pub const IGNORED_QUANTITY_MESSAGE: &str =
    "Quantity 2 was ignored because no second cryptocurrency is selected.";

pub type Rgb = (u8, u8, u8);

pub const GREEN: Rgb = (0, 128, 0);
pub const BLUE: Rgb = (0, 0, 255);
pub const ORANGE: Rgb = (255, 165, 0);
pub const RED: Rgb = (255, 0, 0);
pub const YELLOW: Rgb = (255, 215, 0);
pub const PURPLE: Rgb = (128, 0, 128);

/// Price, SMA-50 and SMA-200 colours per comparison slot.
const PALETTE: [(Rgb, Rgb, Rgb); 2] = [(GREEN, ORANGE, RED), (BLUE, YELLOW, PURPLE)];

/// Raw form parameters, exactly as the browser sent them.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub coin1: Option<String>,
    pub coin2: Option<String>,
    pub qty1: Option<String>,
    pub qty2: Option<String>,
}

/// One or two selected coins with the quantity entered for each.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub holdings: Vec<PortfolioHolding>,
    pub form_errors: Vec<String>,
}

impl Selection {
    pub fn from_query(query: &DashboardQuery) -> Selection {
        let mut form_errors = Vec::new();

        let primary = match query.coin1.as_deref().map(sanitize_coin_id) {
            Some(raw) if !raw.is_empty() => {
                parse_coin(&raw, &mut form_errors).unwrap_or(CoinId::Bitcoin)
            }
            _ => CoinId::Bitcoin,
        };
        let secondary = match query.coin2.as_deref().map(sanitize_coin_id) {
            Some(raw) if !raw.is_empty() && raw != "none" => parse_coin(&raw, &mut form_errors),
            _ => None,
        };

        let mut holdings = vec![PortfolioHolding::new(
            primary,
            quantity(query.qty1.as_deref(), &mut form_errors),
        )];
        match secondary {
            Some(coin) => holdings.push(PortfolioHolding::new(
                coin,
                quantity(query.qty2.as_deref(), &mut form_errors),
            )),
            None if query.qty2.as_deref().is_some_and(|raw| !raw.trim().is_empty()) => {
                form_errors.push(IGNORED_QUANTITY_MESSAGE.to_string());
            }
            None => {}
        }

        Selection {
            holdings,
            form_errors,
        }
    }

    pub fn coins(&self) -> impl Iterator<Item = CoinId> + '_ {
        self.holdings.iter().map(|holding| holding.coin)
    }
}

fn parse_coin(sanitized: &str, form_errors: &mut Vec<String>) -> Option<CoinId> {
    match sanitized.parse::<CoinId>() {
        Ok(coin) => Some(coin),
        Err(e) => {
            form_errors.push(e.to_string());
            None
        }
    }
}

fn quantity(raw: Option<&str>, form_errors: &mut Vec<String>) -> f64 {
    match parse_quantity(raw.unwrap_or_default()) {
        Ok(quantity) => quantity,
        Err(e) => {
            form_errors.push(e.to_string());
            0.0
        }
    }
}

/// Upstream results for a selection, in selection order.
pub struct DashboardData {
    pub snapshots: Vec<Result<CoinSnapshot, ApiError>>,
    /// Empty when any snapshot failed.
    pub histories: Vec<Result<Arc<HistoricalSeries>, ApiError>>,
}

pub async fn load<C: Clock>(
    selection: &Selection,
    api: &CoinGeckoAPI,
    cache: &Mutex<HistoryCache<C>>,
) -> DashboardData {
    let mut snapshots = Vec::with_capacity(selection.holdings.len());
    for coin in selection.coins() {
        let snapshot = api.fetch_snapshot(coin).await;
        if let Err(e) = &snapshot {
            error!("load | snapshot | {}", e);
        }
        snapshots.push(snapshot);
    }

    let mut histories = Vec::new();
    if snapshots.iter().all(Result::is_ok) {
        let mut cache = cache.lock().await;
        for coin in selection.coins() {
            let history = cache.get(coin, api).await;
            if let Err(e) = &history {
                error!("load | history | {}", e);
            }
            histories.push(history);
        }
    } else {
        debug!("load | skipping history, snapshot missing");
    }

    DashboardData {
        snapshots,
        histories,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub name: String,
    pub symbol: String,
    pub price_eur: String,
    pub change_24h: String,
    pub market_cap_eur: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub label: String,
    pub color: Rgb,
    pub dashed: bool,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub title: String,
    pub lines: Vec<ChartLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub name: String,
    pub quantity: f64,
    pub value_eur: String,
    pub value_usd: String,
    pub delta_24h_eur: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardView {
    pub title: Option<String>,
    pub summaries: Vec<SummaryView>,
    pub chart: Option<ChartView>,
    /// `None` hides the portfolio section entirely.
    pub portfolio: Option<Vec<PortfolioView>>,
    pub errors: Vec<String>,
}

pub fn build_view(selection: &Selection, data: &DashboardData) -> DashboardView {
    let mut view = DashboardView {
        errors: selection.form_errors.clone(),
        ..DashboardView::default()
    };

    let mut snapshots = Vec::with_capacity(data.snapshots.len());
    for result in &data.snapshots {
        match result {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => view.errors.push(e.to_string()),
        }
    }
    if snapshots.len() != selection.holdings.len() || snapshots.is_empty() {
        view.errors.push(UNAVAILABLE_MESSAGE.to_string());
        return view;
    }

    view.title = Some(
        snapshots
            .iter()
            .map(|s| format!("{} ({})", s.name, s.symbol_upper()))
            .collect::<Vec<_>>()
            .join(" vs "),
    );
    view.summaries = snapshots.iter().map(|s| summary(s)).collect();

    let mut histories = Vec::with_capacity(data.histories.len());
    for result in &data.histories {
        match result {
            Ok(history) => histories.push(history),
            Err(e) => view.errors.push(e.to_string()),
        }
    }
    if !histories.is_empty() && histories.len() == snapshots.len() {
        view.chart = Some(chart(&snapshots, &histories));
    }

    view.portfolio = Some(
        selection
            .holdings
            .iter()
            .zip(&snapshots)
            .filter(|(holding, _)| !holding.is_empty())
            .map(|(holding, snapshot)| {
                let value = holding.value(snapshot);
                PortfolioView {
                    name: snapshot.name.clone(),
                    quantity: holding.quantity,
                    value_eur: format!("{} EUR", format_amount(value.value_eur)),
                    value_usd: format!("{} USD", format_amount(value.value_usd)),
                    delta_24h_eur: format!("{} EUR", signed_amount(value.delta_24h_eur)),
                }
            })
            .collect(),
    );

    view
}

fn summary(snapshot: &CoinSnapshot) -> SummaryView {
    SummaryView {
        name: snapshot.name.clone(),
        symbol: snapshot.symbol_upper(),
        price_eur: format!("{} EUR", format_amount(snapshot.price_eur)),
        change_24h: format_change(snapshot.change_24h_pct),
        market_cap_eur: format!("{} EUR", format_amount(snapshot.market_cap_eur)),
    }
}

fn signed_amount(value: f64) -> String {
    let amount = format_amount(value);
    if value > 0.0 && amount != "0.00" {
        format!("+{}", amount)
    } else {
        amount
    }
}

fn chart(snapshots: &[&CoinSnapshot], histories: &[&Arc<HistoricalSeries>]) -> ChartView {
    let names: Vec<&str> = snapshots.iter().map(|s| s.name.as_str()).collect();
    let title = format!("{} Price History (Last 30 Days)", names.join(" vs "));

    let indicated: Vec<_> = histories
        .iter()
        .map(|history| indicators::augment(history))
        .collect();

    let mut lines = Vec::new();
    for ((series, name), (price_color, _, _)) in indicated.iter().zip(&names).zip(PALETTE) {
        lines.push(ChartLine {
            label: format!("{} Price", name),
            color: price_color,
            dashed: false,
            points: series.iter().map(|p| (p.timestamp, p.price_eur)).collect(),
        });
    }
    for ((series, name), (_, short_color, long_color)) in indicated.iter().zip(&names).zip(PALETTE)
    {
        let overlays: [(&str, Rgb, fn(&IndicatedPoint) -> Option<f64>); 2] = [
            ("SMA 50", short_color, |p| p.sma_50),
            ("SMA 200", long_color, |p| p.sma_200),
        ];
        for (label, color, column) in overlays {
            let points: Vec<_> = series
                .iter()
                .filter_map(|p| column(p).map(|value| (p.timestamp, value)))
                .collect();
            if points.is_empty() {
                continue;
            }
            lines.push(ChartLine {
                label: format!("{} {}", name, label),
                color,
                dashed: true,
                points,
            });
        }
    }

    ChartView { title, lines }
}
