use crate::{
	bootstrap::AppState,
	common::paths,
	domain::{
		forms::{BoundForm, CommentForm, PostForm},
		identity::RequestingIdentity,
		post::entity::{ImageChange, NewComment, NewPost, PostChanges},
		views::{PostDetailView, PostFormView},
	},
	services::{
		authorization::Denial,
		follow::FollowOutcome,
		response::{ServiceError, ServiceResponse},
		validation::{to_editable_fields, validate_comment, validate_post},
	},
};

/// Write side for posts and comments: gate, then validation, then the store.
pub struct PostHandler;
impl PostHandler {
	pub async fn create_form(
		state: &AppState,
		identity: &RequestingIdentity,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		state.gate().authorize_post_create(identity, requested)?;
		ServiceResponse::render(&PostFormView {
			form: BoundForm::empty(),
			groups: state.store.list_groups().await?,
			is_edit: false,
			post_id: None,
		})
	}

	#[tracing::instrument(skip_all)]
	pub async fn create_post(
		state: &AppState,
		identity: &RequestingIdentity,
		form: PostForm,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let author = state.gate().authorize_post_create(identity, requested)?;
		let groups = state.store.list_groups().await?;

		let validated = match validate_post(&form, &groups) {
			Ok(validated) => validated,
			Err(errors) => {
				tracing::debug!(fields = ?errors.fields(), "post submission rejected");
				return ServiceResponse::render(&PostFormView {
					form: BoundForm::rejected(form, errors),
					groups,
					is_edit: false,
					post_id: None,
				});
			}
		};

		let post = state
			.store
			.create_post(NewPost {
				author_id: author.id,
				text: validated.text,
				group_id: validated.group_id,
				image: match validated.image {
					ImageChange::Replace(path) => Some(path),
					ImageChange::Keep | ImageChange::Clear => None,
				},
			})
			.await?;
		state.invalidate_pages().await;
		tracing::info!(post_id = post.id, author = %author.username, "post created");

		Ok(ServiceResponse::redirect(paths::profile(&author.username)))
	}

	pub async fn edit_form(
		state: &AppState,
		identity: &RequestingIdentity,
		post_id: i64,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let gate = state.gate();
		gate.authenticated(identity, requested)?;
		let post = state.store.get_post(post_id).await?;
		gate.authorize_post_edit(identity, &post, requested)?;

		ServiceResponse::render(&PostFormView {
			form: BoundForm::filled(to_editable_fields(&post)),
			groups: state.store.list_groups().await?,
			is_edit: true,
			post_id: Some(post.id),
		})
	}

	#[tracing::instrument(skip(state, identity, form))]
	pub async fn edit_post(
		state: &AppState,
		identity: &RequestingIdentity,
		post_id: i64,
		form: PostForm,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let gate = state.gate();
		gate.authenticated(identity, requested)?;
		let post = state.store.get_post(post_id).await?;
		gate.authorize_post_edit(identity, &post, requested)?;
		let groups = state.store.list_groups().await?;

		let validated = match validate_post(&form, &groups) {
			Ok(validated) => validated,
			Err(errors) => {
				tracing::debug!(post_id = post.id, fields = ?errors.fields(), "post edit rejected");
				return ServiceResponse::render(&PostFormView {
					form: BoundForm::rejected(form, errors),
					groups,
					is_edit: true,
					post_id: Some(post.id),
				});
			}
		};

		state
			.store
			.update_post(
				post.id,
				PostChanges {
					text: validated.text,
					group_id: validated.group_id,
					image: validated.image,
				},
			)
			.await?;
		state.invalidate_pages().await;
		tracing::info!(post_id = post.id, "post edited");

		Ok(ServiceResponse::redirect(paths::post_detail(post.id)))
	}

	#[tracing::instrument(skip(state, identity))]
	pub async fn delete_post(
		state: &AppState,
		identity: &RequestingIdentity,
		post_id: i64,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let gate = state.gate();
		gate.authenticated(identity, requested)?;
		let post = state.store.get_post(post_id).await?;
		let author = gate.authorize_post_delete(identity, &post, requested)?;

		state.store.delete_post(post.id).await?;
		state.invalidate_pages().await;
		tracing::info!(post_id = post.id, "post deleted");

		Ok(ServiceResponse::redirect(paths::profile(&author.username)))
	}

	/// Author comes from the identity and post from the path, never the form.
	#[tracing::instrument(skip(state, identity, form))]
	pub async fn add_comment(
		state: &AppState,
		identity: &RequestingIdentity,
		post_id: i64,
		form: CommentForm,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let author = state.gate().authorize_comment(identity, requested)?;
		let post = state.store.get_post(post_id).await?;

		let validated = match validate_comment(&form) {
			Ok(validated) => validated,
			Err(errors) => {
				tracing::debug!(post_id = post.id, fields = ?errors.fields(), "comment rejected");
				let comments = state.store.list_comments(post.id).await?;
				return ServiceResponse::render(&PostDetailView {
					post,
					comments,
					form: BoundForm::rejected(form, errors),
				});
			}
		};

		state
			.store
			.create_comment(NewComment {
				post_id: post.id,
				author_id: author.id,
				text: validated.text,
			})
			.await?;

		Ok(ServiceResponse::redirect(paths::post_detail(post.id)))
	}

	#[tracing::instrument(skip(state, identity))]
	pub async fn delete_comment(
		state: &AppState,
		identity: &RequestingIdentity,
		post_id: i64,
		comment_id: i64,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let gate = state.gate();
		gate.authenticated(identity, requested)?;
		let comment = state.store.get_comment(comment_id).await?;
		if comment.post_id != post_id {
			return Err(ServiceError::EntityNotFound("comment"));
		}
		gate.authorize_comment_delete(identity, &comment, requested)?;

		state.store.delete_comment(comment.id).await?;

		Ok(ServiceResponse::redirect(paths::post_detail(post_id)))
	}
}

/// Subscribe and unsubscribe, sending the viewer back where they came from.
pub struct FollowHandler;
impl FollowHandler {
	#[tracing::instrument(skip(state, identity))]
	pub async fn follow(
		state: &AppState,
		identity: &RequestingIdentity,
		username: &str,
		referer: Option<&str>,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let gate = state.gate();
		let follower = gate.authenticated(identity, requested)?;
		let target = state
			.store
			.find_user_by_username(username)
			.await?
			.ok_or(ServiceError::EntityNotFound("user"))?;

		match gate.authorize_follow(identity, &target, requested) {
			Ok(_) => {}
			Err(Denial::SelfFollow { username }) => {
				return Ok(ServiceResponse::redirect(back_to(referer, &username)));
			}
			Err(denial) => return Err(denial.into()),
		}

		match state.follows().follow(follower, &target).await? {
			FollowOutcome::SelfFollow => Ok(ServiceResponse::redirect(back_to(referer, &target.username))),
			FollowOutcome::Created | FollowOutcome::AlreadyFollowing => {
				Ok(ServiceResponse::redirect(paths::profile(&target.username)))
			}
		}
	}

	#[tracing::instrument(skip(state, identity))]
	pub async fn unfollow(
		state: &AppState,
		identity: &RequestingIdentity,
		username: &str,
		referer: Option<&str>,
		requested: &str,
	) -> Result<ServiceResponse, ServiceError> {
		let follower = state.gate().authorize_unfollow(identity, requested)?;
		let target = state
			.store
			.find_user_by_username(username)
			.await?
			.ok_or(ServiceError::EntityNotFound("user"))?;

		state.follows().unfollow(follower, &target).await?;

		Ok(ServiceResponse::redirect(back_to(referer, &target.username)))
	}
}

fn back_to(
	referer: Option<&str>,
	username: &str,
) -> String {
	match referer {
		Some(referer) if !referer.is_empty() => referer.to_string(),
		_ => paths::profile(username),
	}
}
