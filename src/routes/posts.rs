use axum::{
	extract::{rejection::FormRejection, Path, State},
	http::Uri,
	Form,
};

use super::{parse_id, requested_path, submitted};
use crate::{
	bootstrap::AppState,
	domain::{
		forms::{CommentForm, PostForm},
		identity::RequestingIdentity,
	},
	services::{
		handlers::PostHandler,
		response::{ServiceError, ServiceResponse},
	},
};

pub async fn create_form(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	PostHandler::create_form(&state, &identity, &requested_path(&uri)).await
}

pub async fn create_post(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	uri: Uri,
	form: Result<Form<PostForm>, FormRejection>,
) -> Result<ServiceResponse, ServiceError> {
	let requested = requested_path(&uri);
	let form = submitted(&state, &identity, &requested, form)?;
	PostHandler::create_post(&state, &identity, form, &requested).await
}

pub async fn edit_form(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(post_id): Path<String>,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	PostHandler::edit_form(&state, &identity, post_id, &requested_path(&uri)).await
}

pub async fn edit_post(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(post_id): Path<String>,
	uri: Uri,
	form: Result<Form<PostForm>, FormRejection>,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	let requested = requested_path(&uri);
	let form = submitted(&state, &identity, &requested, form)?;
	PostHandler::edit_post(&state, &identity, post_id, form, &requested).await
}

pub async fn delete_post(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(post_id): Path<String>,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	PostHandler::delete_post(&state, &identity, post_id, &requested_path(&uri)).await
}

pub async fn add_comment(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path(post_id): Path<String>,
	uri: Uri,
	form: Result<Form<CommentForm>, FormRejection>,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	let requested = requested_path(&uri);
	let form = submitted(&state, &identity, &requested, form)?;
	PostHandler::add_comment(&state, &identity, post_id, form, &requested).await
}

pub async fn delete_comment(
	State(state): State<AppState>,
	identity: RequestingIdentity,
	Path((post_id, comment_id)): Path<(String, String)>,
	uri: Uri,
) -> Result<ServiceResponse, ServiceError> {
	let post_id = parse_id(&post_id, "post")?;
	let comment_id = parse_id(&comment_id, "comment")?;
	PostHandler::delete_comment(&state, &identity, post_id, comment_id, &requested_path(&uri)).await
}
