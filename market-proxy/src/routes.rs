//! HTTP API routes.

use axum::{
    extract::{rejection::JsonRejection, RawQuery, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

use market_common::config::ProvidersConfig;
use market_common::logging::{trace_id_from_headers, TRACE_ID_HEADER};

use crate::error::ApiError;
use crate::screener::{
    markets, run_query, translate_and_run, Field, PredefinedScreen, QueryDescription, Record,
    ScreenerProvider, TechnicalRating, TradingViewClient, DEFAULT_LIMIT, DEFAULT_SCREEN_COUNT,
};
use crate::ticker::{
    fetch_modules, fetch_summary_detail, normalize_symbols, TickerProvider, YahooFinanceClient,
};

/// Columns returned by `/api/screener` when `fields` is not given.
const DEFAULT_SCREENER_FIELDS: &[&str] = &["name", "close", "volume"];

/// Application state.
///
/// A provider is `None` when it was disabled at startup; handlers that need
/// it answer with "<package> package not installed".
#[derive(Clone, Default)]
pub struct AppState {
    pub screener: Option<Arc<dyn ScreenerProvider>>,
    pub ticker: Option<Arc<dyn TickerProvider>>,
}

impl AppState {
    pub fn new(
        screener: Option<Arc<dyn ScreenerProvider>>,
        ticker: Option<Arc<dyn TickerProvider>>,
    ) -> Self {
        Self { screener, ticker }
    }

    /// Build the HTTP-backed providers that are enabled in config.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let screener = TradingViewClient::from_config(&config.screener)
            .map(|c| Arc::new(c) as Arc<dyn ScreenerProvider>);
        let ticker = YahooFinanceClient::from_config(&config.ticker)
            .map(|c| Arc::new(c) as Arc<dyn TickerProvider>);

        tracing::info!(
            screener = screener.as_ref().map(|p| p.name()).unwrap_or("disabled"),
            ticker = ticker.as_ref().map(|p| p.name()).unwrap_or("disabled"),
            "Providers configured"
        );

        Self::new(screener, ticker)
    }

    fn screener(&self) -> Result<&dyn ScreenerProvider, ApiError> {
        self.screener
            .as_deref()
            .ok_or(ApiError::NotInstalled("screener"))
    }

    fn ticker(&self) -> Result<&dyn TickerProvider, ApiError> {
        self.ticker.as_deref().ok_or(ApiError::NotInstalled("ticker"))
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Ticker
        .route("/api/ticker", get(ticker_data))
        // Screener
        .route("/api/screener", get(screener_data))
        .route("/api/screener/columns", get(screener_columns))
        .route("/api/screener/models", get(screener_models))
        .route("/api/screener/query", post(screener_query))
        .route("/api/screener/technical_rating", get(technical_rating))
        .route("/api/screener/predefined", get(predefined_screens))
        .layer(middleware::from_fn(trace_requests))
        .layer(cors)
        .with_state(state)
}

/// Attach a trace span to every request and echo the trace ID back.
async fn trace_requests(request: Request, next: Next) -> Response {
    let trace_id = trace_id_from_headers(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = market_common::request_span!(trace_id, method = %method, path = %path);

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::debug!(
            status = response.status().as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Query-string parameters, keeping repeated keys.
///
/// List parameters accept both `?k=a&k=b` and `?k=a,b`.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(raw: Option<&str>) -> Self {
        let pairs = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
        Self(pairs)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }

    fn number<T: FromStr>(&self, key: &str) -> Result<Option<T>, ApiError> {
        self.get(key)
            .map(|v| {
                v.parse().map_err(|_| {
                    ApiError::InvalidRequest(format!("Invalid value for '{}': {}", key, v))
                })
            })
            .transpose()
    }
}

fn rows_to_json(rows: Vec<Record>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

// ============ Service ============

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Backend API for ticker and screener data"
    }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "market-proxy",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": {
            "screener": state.screener.as_ref().map(|p| p.name()),
            "ticker": state.ticker.as_ref().map(|p| p.name()),
        }
    }))
}

// ============ Ticker ============

async fn ticker_data(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let provider = state.ticker()?;
    let params = QueryParams::parse(raw.as_deref());

    let symbols = normalize_symbols(&params.list("symbols"));
    if symbols.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Missing required parameter: symbols".into(),
        ));
    }

    let modules = params.list("modules");
    let data = if modules.is_empty() {
        fetch_summary_detail(provider, &symbols).await?
    } else {
        fetch_modules(provider, &symbols, &modules).await?
    };

    Ok(Json(Value::Object(data)))
}

// ============ Screener ============

async fn screener_data(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let provider = state.screener()?;
    let params = QueryParams::parse(raw.as_deref());

    let mut fields = params.list("fields");
    if fields.is_empty() {
        fields = DEFAULT_SCREENER_FIELDS.iter().map(|f| f.to_string()).collect();
    }
    let limit = params.number("limit")?.unwrap_or(DEFAULT_LIMIT);

    let description = QueryDescription {
        select: Some(fields),
        limit: Some(limit),
        ..Default::default()
    };
    let rows = translate_and_run(&description, provider).await?;

    Ok(Json(rows_to_json(rows)))
}

async fn screener_columns(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.screener()?;
    let columns: Vec<&str> = Field::ALL.iter().map(|f| f.ident()).collect();
    Ok(Json(serde_json::json!({ "columns": columns })))
}

async fn screener_models(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.screener()?;
    let models: Vec<&str> = markets::all().collect();
    Ok(Json(serde_json::json!({ "models": models })))
}

async fn screener_query(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let provider = state.screener()?;
    let Json(body) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let description = QueryDescription::from_value(body)?;
    let rows = translate_and_run(&description, provider).await?;

    Ok(Json(rows_to_json(rows)))
}

async fn technical_rating(RawQuery(raw): RawQuery) -> Result<Json<Value>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());

    let score: f64 = params
        .number("rating")?
        .ok_or_else(|| ApiError::InvalidRequest("Missing required parameter: rating".into()))?;
    let rating = TechnicalRating::from_score(score).ok_or_else(|| {
        ApiError::InvalidRequest(format!("Rating must be a finite number, got {}", score))
    })?;

    Ok(Json(serde_json::json!({ "rating": rating })))
}

async fn predefined_screens(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let provider = state.screener()?;
    let params = QueryParams::parse(raw.as_deref());

    // No ids means no screens, not every screen
    let screens = params
        .list("screen_ids")
        .iter()
        .map(|id| id.parse())
        .collect::<Result<Vec<PredefinedScreen>, _>>()?;
    let count = params.number("count")?.unwrap_or(DEFAULT_SCREEN_COUNT);

    let mut out = Map::new();
    for screen in screens {
        let query = screen.query(provider.default_markets().to_vec(), count);
        let rows = run_query(&query, provider).await?;
        out.insert(screen.id().to_string(), rows_to_json(rows));
    }

    Ok(Json(Value::Object(out)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        build_router(AppState::default())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_query_params_lists() {
        let params = QueryParams::parse(Some("symbols=aapl,msft&symbols=GOOG&modules=&x=%20a%20"));
        assert_eq!(params.list("symbols"), ["aapl", "msft", "GOOG"]);
        assert!(params.list("modules").is_empty());
        assert_eq!(params.get("x"), Some("a"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_query_params_number() {
        let params = QueryParams::parse(Some("limit=10&count=ten"));
        assert_eq!(params.number::<usize>("limit").unwrap(), Some(10));
        assert_eq!(params.number::<usize>("offset").unwrap(), None);
        assert!(params.number::<usize>("count").is_err());
    }

    #[tokio::test]
    async fn test_root() {
        let (status, body) = get_json(test_app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Backend API for ticker and screener data");
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = get_json(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["providers"]["screener"], Value::Null);
    }

    #[tokio::test]
    async fn test_trace_id_echoed() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(TRACE_ID_HEADER, "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[TRACE_ID_HEADER], "trace-42");
    }

    #[tokio::test]
    async fn test_rating_without_providers() {
        let (status, body) = get_json(test_app(), "/api/screener/technical_rating?rating=0.3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rating"], "Buy");
    }

    #[tokio::test]
    async fn test_rating_requires_number() {
        let (status, body) = get_json(test_app(), "/api/screener/technical_rating").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required parameter: rating");

        let (status, _) = get_json(test_app(), "/api/screener/technical_rating?rating=NaN").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_columns_not_installed() {
        let (status, body) = get_json(test_app(), "/api/screener/columns").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "screener package not installed");
    }
}
