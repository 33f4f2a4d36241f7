use chrono::Duration;
use coin_model::CoinId;
use coingecko_api::CoinGeckoAPI;
use history_cache::{HistoryCache, SystemClock};
use log::{error, info};
use serde::Serialize;
use std::process::exit;
use tokio::sync::Mutex;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};

use config::Config;
use dashboard::{DashboardQuery, Selection};

mod chart;
mod config;
mod dashboard;
mod html;
mod utils;

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 500;

type SharedCache = Mutex<HistoryCache<SystemClock>>;

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

fn status(status: impl Into<String>) -> StatusResponse {
    StatusResponse {
        status: status.into(),
    }
}

fn coin_from_path(coin: &str) -> Result<CoinId, HttpResponse> {
    utils::sanitize_coin_id(coin)
        .parse::<CoinId>()
        .map_err(|e| HttpResponse::NotFound().json(status(e.to_string())))
}

#[get("/")]
async fn index(
    query: web::Query<DashboardQuery>,
    api: web::Data<CoinGeckoAPI>,
    cache: web::Data<SharedCache>,
) -> impl Responder {
    let selection = Selection::from_query(&query);
    let data = dashboard::load(&selection, api.get_ref(), cache.get_ref()).await;
    let mut view = dashboard::build_view(&selection, &data);

    let chart_svg = match &view.chart {
        Some(chart) => match chart::render_svg(chart, CHART_WIDTH, CHART_HEIGHT) {
            Ok(svg) => Some(svg),
            Err(e) => {
                error!("index | chart | {}", e);
                view.errors.push(e.to_string());
                None
            }
        },
        None => None,
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::render_page(&view, &selection, chart_svg.as_deref()))
}

#[get("/snapshot/{coin}")]
async fn get_snapshot(coin: web::Path<String>, api: web::Data<CoinGeckoAPI>) -> HttpResponse {
    let coin = match coin_from_path(&coin) {
        Ok(coin) => coin,
        Err(response) => return response,
    };
    match api.fetch_snapshot(coin).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => {
            error!("get_snapshot | {}", e);
            HttpResponse::BadGateway().json(status(e.to_string()))
        }
    }
}

#[get("/history/{coin}")]
async fn get_history(
    coin: web::Path<String>,
    api: web::Data<CoinGeckoAPI>,
    cache: web::Data<SharedCache>,
) -> HttpResponse {
    let coin = match coin_from_path(&coin) {
        Ok(coin) => coin,
        Err(response) => return response,
    };
    let history = cache.lock().await.get(coin, api.get_ref()).await;
    match history {
        Ok(history) => HttpResponse::Ok().json(indicators::augment(&history)),
        Err(e) => {
            error!("get_history | {}", e);
            HttpResponse::BadGateway().json(status(e.to_string()))
        }
    }
}

#[get("/healthcheck")]
async fn healthcheck() -> impl Responder {
    web::Json(status("ok"))
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(status("not found"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not create config: {}", e);
            exit(1);
        }
    };

    info!(
        "Starting coin dashboard on {} | upstream: {} | cache ttl: {}m",
        config.bind, config.coingecko_url, config.cache_ttl_minutes
    );

    let api = web::Data::new(CoinGeckoAPI::with_base_url(&config.coingecko_url));
    let cache: web::Data<SharedCache> = web::Data::new(Mutex::new(HistoryCache::with_ttl(
        SystemClock,
        Duration::minutes(config.cache_ttl_minutes),
    )));

    HttpServer::new(move || {
        App::new()
            .app_data(api.clone())
            .app_data(cache.clone())
            .service(index)
            .service(get_snapshot)
            .service(get_history)
            .service(healthcheck)
            .default_service(web::to(not_found))
            .wrap(Logger::default())
    })
    .bind(config.bind.as_str())?
    .workers(config.workers)
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BITCOIN_JSON: &str = r#"{"name": "Bitcoin", "symbol": "btc", "market_data": {
        "current_price": {"eur": 20000.0, "usd": 22000.0},
        "price_change_percentage_24h": 4.0,
        "market_cap": {"eur": 400000000000.0}}}"#;

    static CHART_REQUESTS: AtomicUsize = AtomicUsize::new(0);

    async fn upstream_coin() -> HttpResponse {
        HttpResponse::Ok()
            .content_type("application/json")
            .body(BITCOIN_JSON)
    }

    async fn upstream_chart() -> HttpResponse {
        CHART_REQUESTS.fetch_add(1, Ordering::SeqCst);
        let prices: Vec<String> = (0..720u64)
            .map(|i| format!("[{}, {}]", 1_700_000_000_000 + i * 3_600_000, 19_000 + i))
            .collect();
        HttpResponse::Ok()
            .content_type("application/json")
            .body(format!(r#"{{"prices": [{}]}}"#, prices.join(", ")))
    }

    fn spawn_upstream() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route("/coins/bitcoin", web::get().to(upstream_coin))
                .route(
                    "/coins/bitcoin/market_chart/range",
                    web::get().to(upstream_chart),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    macro_rules! app {
        ($upstream:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(CoinGeckoAPI::with_base_url($upstream)))
                    .app_data(web::Data::new(Mutex::new(HistoryCache::new(SystemClock))))
                    .service(index)
                    .service(get_snapshot)
                    .service(get_history)
                    .service(healthcheck)
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn healthcheck_pass() {
        let app = app!("http://127.0.0.1:1");
        let req = test::TestRequest::get().uri("/healthcheck").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, r#"{"status":"ok"}"#.as_bytes());
    }

    #[actix_web::test]
    async fn not_found_pass() {
        let app = app!("http://127.0.0.1:1");
        let req = test::TestRequest::get().uri("/nope").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn get_snapshot_fail_unknown_coin() {
        let app = app!("http://127.0.0.1:1");
        let req = test::TestRequest::get().uri("/snapshot/solana").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn get_history_fail_upstream_down() {
        let app = app!("http://127.0.0.1:1");
        let req = test::TestRequest::get().uri("/history/bitcoin").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn index_pass_degrades_when_upstream_down() {
        let app = app!("http://127.0.0.1:1");
        let req = test::TestRequest::get()
            .uri("/?coin1=bitcoin&coin2=ethereum&qty1=1")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = test::read_body(res).await;
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains(dashboard::UNAVAILABLE_MESSAGE));
        assert!(page.contains("An error occurred while fetching data for bitcoin"));
        assert!(!page.contains("Market Summary"));
    }

    #[actix_web::test]
    async fn index_pass_full_dashboard() {
        let app = app!(&spawn_upstream());

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/?coin1=bitcoin&coin2=bitcoin&qty1=2.5&qty2=")
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);

            let body = test::read_body(res).await;
            let page = String::from_utf8(body.to_vec()).unwrap();
            assert!(page.contains("Bitcoin (BTC) vs Bitcoin (BTC)"));
            assert!(page.contains("Market Summary"));
            assert!(page.contains("<svg"));
            assert!(page.contains("Bitcoin SMA 200"));
            assert!(page.contains("Portfolio Tracker"));
            assert!(page.contains("<strong>2.5 Bitcoin</strong> is worth: 50,000.00 EUR"));
            assert!(!page.contains("class=\"error\""));
        }

        assert_eq!(CHART_REQUESTS.load(Ordering::SeqCst), 1);
    }
}
