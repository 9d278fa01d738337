use axum::{
	extract::{Path, Query, State},
	http::Uri,
	response::{IntoResponse, Response},
};

use super::{parse_id, requested_path};
use crate::{
	bootstrap::AppState,
	common::{page_cache::CachedPage, pagination::PageQuery},
	domain::{
		identity::RequestingIdentity,
		views::{FollowView, GroupView, IndexView},
	},
	services::response::{render_bytes, ServiceError, ServiceResponse},
};

/// The only page served from the whole-page cache.
pub async fn index(
	State(state): State<AppState>,
	Query(query): Query<PageQuery>,
	uri: Uri,
) -> Result<Response, ServiceError> {
	let key = requested_path(&uri);
	if let Some(page) = state.page_cache.get(&key).await {
		tracing::debug!(%key, "page cache hit");
		return Ok(page.into_response());
	}

	let generation = state.page_cache.generation();
	let page_obj = state.feed().list_all(query.requested()).await?;
	let page = CachedPage::json(render_bytes(&IndexView { page_obj, index: true })?);
	state
		.page_cache
		.set_unless_cleared(key, page.clone(), state.config.page_cache_ttl, generation)
		.await;

	Ok(page.into_response())
}

pub async fn group_posts(
	State(state): State<AppState>,
	Path(slug): Path<String>,
	Query(query): Query<PageQuery>,
) -> Result<ServiceResponse, ServiceError> {
	let (group, page_obj) = state.feed().list_by_group(&slug, query.requested()).await?;
	ServiceResponse::render(&GroupView {
		title: group.title.clone(),
		group,
		page_obj,
	})
}

pub async fn profile(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(username): Path<String>,
	Query(query): Query<PageQuery>,
) -> Result<ServiceResponse, ServiceError> {
	ServiceResponse::render(&state.feed().profile(&username, &identity, query.requested()).await?)
}

pub async fn post_detail(
	State(state): State<AppState>,
	Path(post_id): Path<String>,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	ServiceResponse::render(&state.feed().post_detail(post_id).await?)
}

pub async fn follow_index(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Query(query): Query<PageQuery>,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	state.gate().authenticated(&identity, &requested_path(&uri))?;
	let page_obj = state.feed().list_followed_feed(&identity, query.requested()).await?;
	ServiceResponse::render(&FollowView { page_obj, follow: true })
}
