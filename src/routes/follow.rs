use axum::{
	extract::{Path, State},
	http::{HeaderMap, Uri},
};

use super::{referer, requested_path};
use crate::{
	bootstrap::AppState,
	domain::identity::RequestingIdentity,
	services::{
		handlers::FollowHandler,
		response::{ServiceError, ServiceResponse},
	},
};

pub async fn profile_follow(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(username): Path<String>,
	headers: HeaderMap,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	FollowHandler::follow(&state, &identity, &username, referer(&headers), &requested_path(&uri)).await
}

pub async fn profile_unfollow(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(username): Path<String>,
	headers: HeaderMap,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	FollowHandler::unfollow(&state, &identity, &username, referer(&headers), &requested_path(&uri)).await
}
