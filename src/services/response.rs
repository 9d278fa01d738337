use axum::{
	extract::rejection::FormRejection,
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use bytes::Bytes;
use serde::Serialize;

use super::authorization::Denial;

/// What a page handler hands back to the web layer.
#[derive(Debug)]
pub enum ServiceResponse {
	/// A rendered view model.
	Rendered(Bytes),
	/// `302 Found` to the given location.
	Redirect(String),
}

/// Rendering a view model is serializing it; templating happens downstream.
pub fn render_bytes<V: Serialize>(view: &V) -> Result<Bytes, ServiceError> {
	Ok(serde_json::to_vec(view)?.into())
}

impl ServiceResponse {
	pub fn render<V: Serialize>(view: &V) -> Result<Self, ServiceError> {
		Ok(ServiceResponse::Rendered(render_bytes(view)?))
	}

	pub fn redirect(location: impl Into<String>) -> Self {
		ServiceResponse::Redirect(location.into())
	}
}

impl IntoResponse for ServiceResponse {
	fn into_response(self) -> Response {
		match self {
			ServiceResponse::Rendered(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
			ServiceResponse::Redirect(location) => found(location),
		}
	}
}

pub fn found(location: String) -> Response {
	(StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error("{0} not found")]
	EntityNotFound(&'static str),
	#[error("access denied: {0:?}")]
	Denied(Denial),
	#[error("conflict: {0}")]
	Conflict(String),
	#[error("bad request: {0}")]
	BadRequest(String),
	#[error("unreadable form: {0}")]
	FormRejected(#[from] FormRejection),
	#[error("database error: {0}")]
	DatabaseError(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	MigrationError(#[from] sqlx::migrate::MigrateError),
	#[error("rendering error: {0}")]
	RenderError(#[from] serde_json::Error),
	#[error("configuration error: {0}")]
	ConfigError(String),
	#[error("internal error: {0}")]
	Internal(String),
}

impl From<Denial> for ServiceError {
	fn from(value: Denial) -> Self {
		ServiceError::Denied(value)
	}
}

impl IntoResponse for ServiceError {
	fn into_response(self) -> Response {
		// extractor rejections already know their status
		if let ServiceError::FormRejected(rejection) = self {
			return rejection.into_response();
		}
		let status = match &self {
			ServiceError::FormRejected(_) => StatusCode::BAD_REQUEST,
			ServiceError::Denied(denial) => return found(denial.location()),
			ServiceError::EntityNotFound(_) => StatusCode::NOT_FOUND,
			ServiceError::Conflict(_) => StatusCode::CONFLICT,
			ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServiceError::DatabaseError(_)
			| ServiceError::MigrationError(_)
			| ServiceError::RenderError(_)
			| ServiceError::ConfigError(_)
			| ServiceError::Internal(_) => {
				tracing::error!("request failed: {}", self);
				StatusCode::INTERNAL_SERVER_ERROR
			}
		};

		(
			status,
			Json(serde_json::json!({
				"error": self.to_string(),
				"status": status.as_u16(),
			})),
		)
			.into_response()
	}
}
