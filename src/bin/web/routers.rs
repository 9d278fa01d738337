use axum::{
	http::{HeaderValue, Method},
	Router,
};
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};

use blog::{bootstrap::AppState, config::Config, routes::create_routes};

/// Page routes wrapped in the cross-cutting layers every deployment gets.
pub fn app(
	state: AppState,
	config: &Config,
) -> Router {
	let origins: Vec<HeaderValue> = config
		.allow_origins
		.split(',')
		.map(str::trim)
		.filter(|origin| !origin.is_empty())
		.filter_map(|origin| match origin.parse::<HeaderValue>() {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(%origin, "ignoring invalid origin in ALLOW_ORIGINS");
				None
			}
		})
		.collect();

	create_routes(state)
		.layer(
			CorsLayer::new()
				.allow_origin(AllowOrigin::list(origins))
				.allow_methods([Method::GET, Method::POST]),
		)
		.layer(TraceLayer::new_for_http())
}
