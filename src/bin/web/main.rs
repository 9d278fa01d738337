pub mod routers;

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use blog::{bootstrap::Bootstrap, dependencies::config, services::response::ServiceError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
	dotenv::dotenv().ok();
	let config = config()?;

	// ! Tracing
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			// axum logs rejections from built-in extractors with the `axum::rejection`
			// target, at `TRACE` level. `axum::rejection=trace` enables showing those events
			format!("blog={},tower_http=debug,axum::rejection=trace", config.log_level).into()
		}))
		.with(tracing_subscriber::fmt::layer())
		.init();

	// ! Connection
	tracing::info!(storage = ?config.storage, "wiring application state");
	let state = Bootstrap::app_state(Arc::new(config.clone())).await?;

	let app = routers::app(state, config);

	let address = SocketAddr::from_str(&config.server_ip_port)
		.map_err(|err| ServiceError::ConfigError(format!("SERVER_IP_PORT `{}`: {err}", config.server_ip_port)))?;
	tracing::info!(%address, "starting web server");
	axum::Server::bind(&address)
		.serve(app.into_make_service())
		.await
		.map_err(|err| ServiceError::Internal(err.to_string()))
}
