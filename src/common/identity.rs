use std::convert::Infallible;

use axum::{
	extract::{FromRequestParts, State},
	http::{request::Parts, Request},
	middleware::Next,
	response::Response,
};

use crate::{bootstrap::AppState, domain::identity::RequestingIdentity, services::response::ServiceError};

/// Resolves the username the upstream identity provider put in the configured
/// header and attaches the matching [`RequestingIdentity`] to the request.
///
/// A missing header, a header that is not valid text, or a username the store
/// does not know all leave the request anonymous. A failing store fails the
/// request.
pub async fn resolve_identity<B>(
	State(state): State<AppState>,
	mut request: Request<B>,
	next: Next<B>,
) -> Result<Response, ServiceError> {
	let username = request
		.headers()
		.get(state.config.identity_header.as_str())
		.and_then(|value| match value.to_str() {
			Ok(username) => Some(username.trim().to_owned()),
			Err(_) => {
				tracing::warn!("identity header is not valid text, treating request as anonymous");
				None
			}
		})
		.filter(|username| !username.is_empty());

	let identity = match username {
		None => RequestingIdentity::anonymous(),
		Some(username) => {
			let user = state.store.find_user_by_username(&username).await?;
			if user.is_none() {
				tracing::info!(%username, "unknown user in identity header");
			}
			user.into()
		}
	};

	request.extensions_mut().insert(identity);
	Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestingIdentity {
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(parts.extensions.get::<RequestingIdentity>().cloned().unwrap_or_default())
	}
}
