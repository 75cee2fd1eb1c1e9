//! Market Proxy - JSON endpoints over a market screener and a quote provider.
//!
//! This crate provides:
//! - A declarative screener query translator backed by a typed field registry
//! - HTTP adapters for the TradingView scanner and Yahoo Finance quote summaries
//! - The axum router exposing both as JSON
//!
//! ## Architecture
//!
//! ```text
//! Client → Router (trace → CORS) → handler → ScreenerProvider / TickerProvider → upstream
//! ```
//!
//! Providers are chosen once at startup from config and held as trait
//! objects in [`AppState`].

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod error;
pub mod provider;
pub mod routes;
pub mod screener;
pub mod ticker;

pub use error::ApiError;
pub use provider::ProviderError;
pub use routes::{build_router, AppState};
pub use screener::{QueryDescription, QueryError, ScreenerProvider, ScreenerQuery, TradingViewClient};
pub use ticker::{TickerProvider, YahooFinanceClient};

use anyhow::Result;
use axum::body::{Bytes, HttpBody};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Router};
use market_common::config::Config;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Largest accepted request body (query descriptions are small).
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The proxy HTTP service.
pub struct ProxyService {
    config: Config,
    state: AppState,
}

impl ProxyService {
    /// Create the service with providers built from config.
    pub fn new(config: Config) -> Self {
        let state = AppState::from_config(&config.providers);
        Self { config, state }
    }

    /// Create the service with explicit providers.
    pub fn with_state(config: Config, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with service-level limits applied.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(self.config.server.request_timeout_secs),
            ))
            .layer(middleware::map_response(json_limit_errors))
    }

    /// Bind and serve until SIGINT/SIGTERM.
    pub async fn start(self) -> Result<()> {
        let addr = self.config.listen_address();
        let app = self.router();

        tracing::info!("Starting Market Proxy on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Market Proxy stopped");
        Ok(())
    }
}

/// Give the bare 408/413 answers of the limit layers the `{"error": msg}` body.
async fn json_limit_errors<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge.into_response(),
        StatusCode::REQUEST_TIMEOUT => ApiError::Timeout.into_response(),
        _ => response.into_response(),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down");
    }
}
