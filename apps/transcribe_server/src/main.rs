use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use transcribe_config::Config;
use transcribe_server::{build_default_state, routes};

/// Converts a tower middleware error (currently only `TimeoutLayer`'s
/// `Elapsed`) into an HTTP response — teacher pattern from `file_host`'s
/// `handle_tower_error`.
async fn handle_tower_error(error: BoxError) -> (StatusCode, String) {
	if error.is::<tower::timeout::error::Elapsed>() {
		(StatusCode::REQUEST_TIMEOUT, "request timed out".to_owned())
	} else {
		tracing::error!(%error, "unhandled tower middleware error");
		(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();

	let config = Config::parse();
	config.validate()?;
	init_tracing(&config);

	let config = Arc::new(config);
	tokio::fs::create_dir_all(&config.work_dir).await?;
	tokio::fs::create_dir_all(&config.output_dir).await?;

	let shutdown = CancellationToken::new();
	let state = build_default_state(config.clone(), shutdown.clone()).await?;

	let app = routes::router(state).layer(
		ServiceBuilder::new()
			.layer(TraceLayer::new_for_http())
			.layer(HandleErrorLayer::new(handle_tower_error))
			.layer(RequestBodyLimitLayer::new(config.max_request_body_bytes))
			.layer(TimeoutLayer::new(std::time::Duration::from_secs(config.request_timeout_secs))),
	);

	let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
	let listener = TcpListener::bind(addr).await?;
	tracing::info!(%addr, "transcribe_server listening");

	let signal_shutdown = shutdown.clone();
	tokio::spawn(async move {
		tokio::signal::ctrl_c().await.ok();
		tracing::info!("received Ctrl+C, initiating shutdown");
		signal_shutdown.cancel();
	});

	let server_shutdown = shutdown.clone();
	axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async move { server_shutdown.cancelled().await }).await?;

	tracing::info!("server stopped");
	Ok(())
}

fn init_tracing(config: &Config) {
	let filter = EnvFilter::from_str(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(tracing_subscriber::fmt::layer().event_format(tracing_subscriber::fmt::format().pretty()).with_filter(filter))
		})
		.init();
}
