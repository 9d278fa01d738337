pub(crate) mod memory;
pub(crate) mod postgres;

use async_trait::async_trait;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;
use crate::{
	domain::{
		follow::Follow,
		identity::User,
		post::{
			entity::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges, GROUP_TITLE_MAX_LENGTH},
			CommentCard, PostCard,
		},
	},
	services::response::ServiceError,
};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
	All,
	Group(i64),
	Author(i64),
	/// Posts by every author the user follows.
	FollowedBy(i64),
}

/// Persistence for users, posts, groups, comments and follows.
///
/// Every call touches a single row (or a single listing query); there are no
/// cross-entity transactions. Listings come back newest first with author and
/// group resolved.
#[async_trait]
pub trait EntityStore: Send + Sync {
	async fn create_user(
		&self,
		username: &str,
	) -> Result<User, ServiceError>;
	async fn find_user_by_username(
		&self,
		username: &str,
	) -> Result<Option<User>, ServiceError>;
	/// Takes the user's posts, comments and follow records with it.
	async fn delete_user(
		&self,
		id: i64,
	) -> Result<(), ServiceError>;

	async fn create_group(
		&self,
		group: NewGroup,
	) -> Result<Group, ServiceError>;
	async fn find_group_by_slug(
		&self,
		slug: &str,
	) -> Result<Option<Group>, ServiceError>;
	async fn list_groups(&self) -> Result<Vec<Group>, ServiceError>;
	/// Posts of the group lose their group and stay.
	async fn delete_group(
		&self,
		id: i64,
	) -> Result<(), ServiceError>;

	async fn create_post(
		&self,
		post: NewPost,
	) -> Result<Post, ServiceError>;
	async fn get_post(
		&self,
		id: i64,
	) -> Result<PostCard, ServiceError>;
	async fn update_post(
		&self,
		id: i64,
		changes: PostChanges,
	) -> Result<Post, ServiceError>;
	/// Comments of the post go with it.
	async fn delete_post(
		&self,
		id: i64,
	) -> Result<(), ServiceError>;
	async fn list_posts(
		&self,
		filter: FeedFilter,
		limit: u64,
		offset: u64,
	) -> Result<Vec<PostCard>, ServiceError>;
	async fn count_posts(
		&self,
		filter: FeedFilter,
	) -> Result<u64, ServiceError>;

	async fn create_comment(
		&self,
		comment: NewComment,
	) -> Result<Comment, ServiceError>;
	async fn get_comment(
		&self,
		id: i64,
	) -> Result<Comment, ServiceError>;
	/// Oldest first.
	async fn list_comments(
		&self,
		post_id: i64,
	) -> Result<Vec<CommentCard>, ServiceError>;
	async fn delete_comment(
		&self,
		id: i64,
	) -> Result<(), ServiceError>;

	async fn find_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<Option<Follow>, ServiceError>;
	/// Inserts the pair unless it exists. Returns whether a row was inserted.
	async fn create_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError>;
	/// Returns whether a row was removed.
	async fn delete_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError>;
	/// Number of authors the user follows.
	async fn count_following(
		&self,
		follower_id: i64,
	) -> Result<u64, ServiceError>;
}

pub(crate) fn check_new_group(group: &NewGroup) -> Result<(), ServiceError> {
	if !Group::is_valid_slug(&group.slug) {
		return Err(ServiceError::BadRequest(format!("invalid slug `{}`", group.slug)));
	}
	if group.title.trim().is_empty() || group.title.chars().count() > GROUP_TITLE_MAX_LENGTH {
		return Err(ServiceError::BadRequest("group title must be 1 to 200 characters".into()));
	}
	Ok(())
}

pub(crate) fn check_text(text: &str) -> Result<(), ServiceError> {
	if text.trim().is_empty() {
		return Err(ServiceError::BadRequest("text must not be empty".into()));
	}
	Ok(())
}
